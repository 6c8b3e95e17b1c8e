use crate::ai_provider::AiProvider;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shop-lens")]
#[command(about = "写真から商品カタログを検索する画像検索ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// AIプロバイダ (openai/gemini/claude)。省略時は設定ファイルの値
    #[arg(long, global = true)]
    pub provider: Option<AiProvider>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像（またはフォルダ内の画像）に合う商品を検索
    Search {
        /// 画像ファイルまたはフォルダのパス
        #[arg(required = true)]
        path: PathBuf,

        /// 商品カタログ (.json / .xlsx)
        #[arg(short, long)]
        catalog: PathBuf,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,

        /// スコアと加点理由を表示
        #[arg(short, long)]
        explain: bool,

        /// キャッシュを使用（同じ画像の再解析をスキップ）
        #[arg(long)]
        use_cache: bool,
    },

    /// 画像から抽出した属性をJSONで出力
    Analyze {
        /// 画像ファイルのパス
        #[arg(required = true)]
        image: PathBuf,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// キャッシュを使用
        #[arg(long)]
        use_cache: bool,
    },

    /// 保存済みの属性JSONでカタログを照合（API呼び出しなし）
    Rank {
        /// 属性JSONファイル（analyzeの出力）
        #[arg(short, long)]
        attributes: PathBuf,

        /// 商品カタログ (.json / .xlsx)
        #[arg(short, long)]
        catalog: PathBuf,

        /// 結果をJSONで出力
        #[arg(long)]
        json: bool,

        /// スコアと加点理由を表示
        #[arg(short, long)]
        explain: bool,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}
