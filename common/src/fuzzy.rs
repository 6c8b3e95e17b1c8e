//! あいまい文字列照合
//!
//! 完全一致の部分文字列チェックでは拾えない綴りの揺れ（"sneekers" と
//! "sneakers"、単数形と複数形など）や、語の一部を共有する言い換え
//! （物体 "sneaker" + 説明 "running shoe" と商品 "running shoes for trails"）を
//! 拾うための近似照合。共有する語が一つもなければ一致しない。
//!
//! クエリを32文字以内のチャンクに分割し、チャンクごとに
//! `編集距離 / チャンク長 + 開始位置 / 100` の最小値をスコアとする。
//! テキスト先頭から離れた一致ほど不利になる。
//! スコアが 0.6 を超えるチャンクは不一致（1.0）として扱い、
//! 全チャンクの平均を正規化距離（0 = 完全一致, 1 = 一致なし）とする。

/// チャンクあたりの最大文字数
pub const MAX_CHUNK_CHARS: usize = 32;

/// チャンク単位で一致とみなすスコアの上限
pub const CHUNK_MATCH_THRESHOLD: f64 = 0.6;

/// 開始位置のペナルティ分母（この文字数だけ離れると1.0）
pub const LOCATION_DISTANCE: usize = 100;

/// あいまい照合の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch {
    /// 正規化距離（0.0-1.0）
    pub distance: f64,
}

impl FuzzyMatch {
    /// 類似度（1 - 距離）
    pub fn similarity(&self) -> f64 {
        1.0 - self.distance
    }
}

/// 閾値未満の距離なら一致とみなす
///
/// # Arguments
/// * `query` - 照合クエリ
/// * `text` - 照合対象テキスト
/// * `threshold` - 受理する正規化距離の上限（この値未満で一致）
pub fn fuzzy_match(query: &str, text: &str, threshold: f64) -> Option<FuzzyMatch> {
    let distance = normalized_distance(query, text)?;
    (distance < threshold).then_some(FuzzyMatch { distance })
}

/// クエリとテキストの正規化距離を計算
///
/// 空のクエリは `None`。どのチャンクも一致しなければ 1.0。
pub fn normalized_distance(query: &str, text: &str) -> Option<f64> {
    let query = query.to_lowercase();
    let chunks = split_chunks(&query, MAX_CHUNK_CHARS);
    if chunks.is_empty() {
        return None;
    }

    let text_chars: Vec<char> = text.to_lowercase().chars().collect();
    let scores: Vec<Option<f64>> = chunks
        .iter()
        .map(|chunk| {
            let pattern: Vec<char> = chunk.chars().collect();
            chunk_score(&pattern, &text_chars)
        })
        .collect();

    if scores.iter().all(Option::is_none) {
        return Some(1.0);
    }

    let total: f64 = scores.iter().map(|s| s.unwrap_or(1.0)).sum();
    Some((total / chunks.len() as f64).min(1.0))
}

/// 単語境界でクエリを分割
fn split_chunks(query: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in query.split_whitespace() {
        let word_len = word.chars().count();
        if current_len > 0 && current_len + 1 + word_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if current_len > 0 {
        chunks.push(current);
    }

    chunks
}

/// 1チャンクのスコア（閾値を超えたら `None`）
///
/// 開始位置ごとに、そこから始まる部分文字列との最小編集距離を求め、
/// 誤り率と位置ペナルティの和が最小になる位置を採用する。
fn chunk_score(pattern: &[char], text: &[char]) -> Option<f64> {
    if pattern.is_empty() {
        return None;
    }

    // これより後ろの開始位置は位置ペナルティだけで閾値を超える
    let max_start = (CHUNK_MATCH_THRESHOLD * LOCATION_DISTANCE as f64) as usize;
    let last_start = max_start.min(text.len().saturating_sub(1));

    let best = (0..=last_start)
        .map(|start| {
            let errors = prefix_edit_distance(pattern, &text[start..]);
            errors as f64 / pattern.len() as f64 + start as f64 / LOCATION_DISTANCE as f64
        })
        .fold(f64::INFINITY, f64::min);

    (best <= CHUNK_MATCH_THRESHOLD).then_some(best)
}

/// パターンとテキスト先頭部分（任意の長さ）との最小編集距離
///
/// レーベンシュタイン距離の行列の最終行から最小値を取る。
fn prefix_edit_distance(pattern: &[char], text: &[char]) -> usize {
    let p_len = pattern.len();
    let t_len = text.len();

    if p_len == 0 {
        return 0;
    }
    if t_len == 0 {
        return p_len;
    }

    let mut matrix = vec![vec![0; t_len + 1]; p_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=t_len {
        matrix[0][j] = j;
    }

    for i in 1..=p_len {
        for j in 1..=t_len {
            let cost = if pattern[i - 1] == text[j - 1] { 0 } else { 1 };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[p_len].iter().copied().min().unwrap_or(p_len)
}
