use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use shop_lens::{analyzer, cli, config, logging, scanner, search};
use shop_lens::search::BatchExtraction;
use shop_lens::catalog::price::{format_aed, format_aed_short};
use shop_lens::catalog::{CatalogStore, FileCatalog, Product};
use shop_lens_common::{ScoredCandidate, VisualAttributes};
use cli::{Cli, Commands};
use config::Config;
use std::path::{Path, PathBuf};

/// JSON出力用の1候補
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchOutput<'a> {
    id: &'a str,
    name: &'a str,
    price: String,
    category: Option<&'a str>,
    image_url: Option<&'a str>,
    score: u32,
    reasons: &'a [String],
}

/// JSON出力用の1画像分
#[derive(Serialize)]
struct SearchOutput<'a> {
    file: &'a str,
    attributes: &'a VisualAttributes,
    matches: Vec<MatchOutput<'a>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    let mut config = Config::load().context("設定ファイルの読み込みに失敗しました")?;
    if let Some(provider) = cli.provider {
        if provider != config.provider {
            // プロバイダを切り替えたら既定モデルに戻す
            config.model = None;
        }
        config.provider = provider;
    }

    match cli.command {
        Commands::Search { path, catalog, json, explain, use_cache } => {
            if !json {
                println!("🔍 shop-lens - 画像検索\n");
            }

            // 1. カタログ
            let store = FileCatalog::new(&catalog);
            let products = store
                .available_products()
                .await
                .with_context(|| format!("カタログを読み込めません: {}", catalog.display()))?;
            if !json {
                println!("✔ 販売中の商品: {}件", products.len());
            }

            // 2. 画像スキャン
            let images = scanner::scan_path(&path)?;
            if images.is_empty() {
                return Err(shop_lens::error::ShopLensError::NoImagesFound(path.display().to_string()).into());
            }
            if !json {
                println!("✔ {}枚の画像を検出\n", images.len());
            }

            if products.is_empty() {
                // 照合対象がなければAPIを呼ばない
                if json {
                    println!("[]");
                } else {
                    println!("該当する商品はありません（販売中の商品がカタログにありません）");
                }
                return Ok(());
            }

            // 3. 属性抽出
            let image_search = search::ImageSearch::from_config(&config)?;
            let cache_dir = cache_folder(&path);
            let mut cache = use_cache.then(|| analyzer::CacheFile::load(&cache_dir));

            let progress = if json || images.len() == 1 {
                ProgressBar::hidden()
            } else {
                let pb = ProgressBar::new(images.len() as u64);
                pb.set_style(
                    ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
                        .context("プログレスバーのテンプレートが不正です")?
                        .progress_chars("=> "),
                );
                pb
            };

            let BatchExtraction { extracted, failures } = image_search
                .extract_batch(&images, config.max_image_size, cache.as_mut(), |info| {
                    progress.set_message(info.file_name.clone());
                    progress.inc(1);
                })
                .await;
            progress.finish_and_clear();

            // 失敗があっても成功分は保存
            if let Some(cache) = &cache {
                cache.save(&cache_dir)?;
            }

            if images.len() == 1 {
                if let Some((_, e)) = failures.into_iter().next() {
                    return Err(e.into());
                }
            } else if !failures.is_empty() && !json {
                println!("⚠ {}枚の画像は解析できませんでした", failures.len());
            }

            // 4. 照合（並列）
            let attribute_sets: Vec<VisualAttributes> = extracted.iter().map(|(_, a)| a.clone()).collect();
            let ranked = search::rank_batch(image_search.matcher(), &attribute_sets, &products);

            if json {
                let outputs: Vec<SearchOutput> = extracted
                    .iter()
                    .zip(&ranked)
                    .map(|((file, attributes), candidates)| SearchOutput {
                        file,
                        attributes,
                        matches: candidates.iter().map(match_output).collect(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&outputs)?);
            } else {
                for ((file, attributes), candidates) in extracted.iter().zip(&ranked) {
                    print_matches(file, attributes, candidates, explain);
                }
                println!("\n✅ 検索完了");
            }
        }

        Commands::Analyze { image, output, use_cache } => {
            let images = scanner::scan_path(&image)?;
            let info = images
                .first()
                .ok_or_else(|| shop_lens::error::ShopLensError::NoImagesFound(image.display().to_string()))?;
            let payload = scanner::load_image(info, config.max_image_size)?;
            let extractor = analyzer::AttributeExtractor::new(analyzer::build_capability(&config)?);

            let attributes = if use_cache {
                let cache_dir = cache_folder(&image);
                let mut cache = analyzer::CacheFile::load(&cache_dir);
                let attributes = extractor.extract_cached(&payload, &mut cache).await?;
                cache.save(&cache_dir)?;
                attributes
            } else {
                extractor.extract(&payload).await?
            };

            let json = serde_json::to_string_pretty(&attributes)?;
            match output {
                Some(output) => {
                    std::fs::write(&output, json)?;
                    println!("✔ 属性を保存: {}", output.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Rank { attributes, catalog, json, explain } => {
            let content = std::fs::read_to_string(&attributes)
                .with_context(|| format!("属性ファイルを読み込めません: {}", attributes.display()))?;
            let parsed: VisualAttributes = serde_json::from_str(&content)?;

            let products = FileCatalog::new(&catalog).available_products().await?;
            let matcher = config.matcher();
            let candidates = search::rank_and_log(&matcher, &parsed, &products);

            let file = attributes.display().to_string();
            if json {
                let output = SearchOutput {
                    file: &file,
                    attributes: &parsed,
                    matches: candidates.iter().map(match_output).collect(),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_matches(&file, &parsed, &candidates, explain);
            }
        }

        Commands::Config { set_api_key, show } => {
            if let Some(key) = set_api_key {
                // --provider の一時指定は設定ファイルに残さない
                let mut stored = Config::load()?;
                stored.set_api_key(config.provider, key)?;
                config.api_keys = stored.api_keys;
                println!("✔ {} のAPIキーを設定しました", config.provider);
            }

            if show {
                println!("設定:");
                println!("  プロバイダ: {}", config.provider);
                println!("  モデル: {}", config.model());
                println!("  最大画像サイズ: {}px", config.max_image_size);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!(
                    "  APIキー: {}",
                    if config.get_api_key().is_ok() { "設定済み" } else { "未設定" }
                );
                println!("  重み: {}", serde_json::to_string(&config.weights)?);
                println!("  上限: {}", serde_json::to_string(&config.limits)?);
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = analyzer::CacheFile::cache_path(&target);

            if info || !clear {
                if cache_path.exists() {
                    let cache = analyzer::CacheFile::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match analyzer::CacheFile::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}

/// キャッシュの置き場所（ファイルなら親フォルダ）
fn cache_folder(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn match_output<'a>(candidate: &'a ScoredCandidate<'_, Product>) -> MatchOutput<'a> {
    let product = candidate.product;
    MatchOutput {
        id: &product.id,
        name: &product.name,
        price: format_aed(&product.price),
        category: catalog_category(product),
        image_url: product.image_url.as_deref(),
        score: candidate.score,
        reasons: &candidate.reasons,
    }
}

fn catalog_category(product: &Product) -> Option<&str> {
    shop_lens_common::CatalogItem::category(product)
}

fn print_matches(file: &str, attributes: &VisualAttributes, candidates: &[ScoredCandidate<'_, Product>], explain: bool) {
    println!("📷 {}", file);
    if explain {
        println!("  物体: {}", attributes.objects.join(", "));
        println!("  カテゴリ: {}", attributes.categories.join(", "));
        println!("  色: {}", attributes.colors.join(", "));
        println!("  素材: {}", attributes.materials.join(", "));
        if let Some(brand) = &attributes.brand {
            println!("  ブランド: {}", brand);
        }
    }

    if candidates.is_empty() {
        println!("  該当する商品はありません\n");
        return;
    }

    for (rank, candidate) in candidates.iter().enumerate() {
        let product = candidate.product;
        println!("  {}. {} ({})", rank + 1, product.name, format_aed_short(&product.price));
        if explain {
            println!("     スコア: {}  [{}]", candidate.score, candidate.reasons.join("; "));
        }
    }
    println!();
}
