//! Confidence-weighted vote over agent opinions.

use coinsight_models::{AgentOpinion, ConsensusDecision, Stance};

/// Tie-break order: the more conservative stance wins.
const TIE_ORDER: [Stance; 3] = [Stance::Sell, Stance::Hold, Stance::Buy];

/// Sum confidence per stance and pick the heaviest.
///
/// Confidence is the winning weight over the number of opinions, so a
/// unanimous debate of confident agents approaches 1.0. An empty slate
/// yields HOLD with zero confidence.
pub fn aggregate(opinions: Vec<AgentOpinion>) -> ConsensusDecision {
    if opinions.is_empty() {
        return ConsensusDecision {
            decision: Stance::Hold,
            confidence: 0.0,
            opinions,
            rationale: vec!["No opinions available".to_string()],
        };
    }

    let weight = |stance: Stance| -> f64 {
        opinions
            .iter()
            .filter(|o| o.stance == stance)
            .map(|o| o.confidence)
            .sum()
    };

    let mut decision = TIE_ORDER[0];
    let mut top = weight(decision);
    for stance in &TIE_ORDER[1..] {
        let w = weight(*stance);
        if w > top {
            decision = *stance;
            top = w;
        }
    }

    let confidence = f64::min(1.0, top / f64::max(1.0, opinions.len() as f64));
    let rationale = opinions
        .iter()
        .map(|o| format!("[{}] {}", o.agent, o.rationale))
        .collect();

    ConsensusDecision {
        decision,
        confidence,
        opinions,
        rationale,
    }
}
