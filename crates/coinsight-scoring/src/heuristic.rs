//! Deterministic, input-only base score. The floor every analysis starts from.

use coinsight_models::{is_address, AnalysisResult, Outlook, Risk};

use crate::normalize::clamp;

const START: i32 = 50;
const MEME_WORDS: [&str; 5] = ["inu", "moon", "pump", "elon", "shib"];
const BLUE_CHIPS: [&str; 6] = ["BTC", "ETH", "SOL", "BNB", "USDC", "USDT"];

/// Base-31 polynomial hash over UTF-16 code units, wrapping at 32 bits.
pub fn stable_hash(s: &str) -> u32 {
    s.encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

fn outlook_from_hash(h: u32) -> Outlook {
    match h % 3 {
        0 => Outlook::Bearish,
        1 => Outlook::Neutral,
        _ => Outlook::Bullish,
    }
}

fn is_ticker(token: &str) -> bool {
    (2..=5).contains(&token.len()) && token.bytes().all(|b| b.is_ascii_uppercase())
}

pub fn base_score(raw: &str) -> AnalysisResult {
    let token = raw.trim();
    let h = stable_hash(token);
    let address = is_address(token);
    let mut score = START;
    let mut evidence = vec![format!(
        "Heuristic: token type inferred as {}; base score {START}.",
        if address { "ADDRESS" } else { "SYMBOL" }
    )];

    if address {
        let offset = (h % 11) as i32 - 5;
        score += offset;
        evidence.push(format!("Heuristic: address offset {offset:+} from token hash."));
    } else {
        if is_ticker(token) {
            score += 10;
            evidence.push("Heuristic: ticker pattern looks established (+10).".to_string());
        }
        if token.encode_utf16().count() > 5 {
            score -= 5;
            evidence.push("Heuristic: overlong ticker (-5).".to_string());
        }
    }

    let lower = token.to_lowercase();
    if let Some(word) = MEME_WORDS.iter().find(|w| lower.contains(*w)) {
        score -= 10;
        evidence.push(format!("Scam checks: meme keyword \"{word}\" detected (-10)."));
    }

    if BLUE_CHIPS.contains(&token) {
        score += 15;
        evidence.push("Heuristic: blue-chip asset (+15).".to_string());
    }

    let score = clamp(f64::from(score), 0.0, 100.0) as u8;
    let outlook = outlook_from_hash(h);
    evidence.push(format!("Heuristic: outlook {outlook} derived from token hash."));

    AnalysisResult {
        token: token.to_string(),
        score,
        risk: Risk::from_score(score),
        outlook,
        evidence,
    }
}
