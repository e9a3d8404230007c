use std::collections::HashSet;

use cachesim_moesi::{CoherenceState, Snapshot};

/// Checks the system-wide MOESI invariants on a snapshot.
pub fn check_coherence(snap: &Snapshot) -> Result<(), String> {
    let mut tags = HashSet::new();
    for (p, lines) in snap.0.iter().enumerate() {
        let mut seen = HashSet::new();
        for l in lines {
            if l.tag.is_none() != (l.state == CoherenceState::Invalid) {
                return Err(format!("P{p}: line {:?} breaks tag=None <=> Invalid", l));
            }
            if let Some(tag) = l.tag {
                if !seen.insert(tag) {
                    return Err(format!("P{p}: tag {tag} cached twice"));
                }
                tags.insert(tag);
            }
        }
    }

    for tag in tags {
        let holders = snap.holders(tag);
        let count = |s: CoherenceState| holders.iter().filter(|(_, h)| *h == s).count();
        let (m, o, e) = (
            count(CoherenceState::Modified),
            count(CoherenceState::Owned),
            count(CoherenceState::Exclusive),
        );
        if m + e > 1 || o > 1 {
            return Err(format!("tag {tag}: too many owners {:?}", holders));
        }
        if (m == 1 || e == 1) && holders.len() != 1 {
            return Err(format!("tag {tag}: M/E line is not alone {:?}", holders));
        }
        if o == 1 && holders.len() != 1 + count(CoherenceState::Shared) {
            return Err(format!("tag {tag}: O line next to non-Shared copies {:?}", holders));
        }
    }
    Ok(())
}
