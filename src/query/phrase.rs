//! Phrase verification
//!
//! A phrase matches a record when some start position lines every phrase
//! word up at its slot offset. For a gap-free phrase the offsets are
//! 0, 1, 2, .. and this reduces to checking consecutive positions; ignored
//! phrase tokens shift the offsets of the words that follow them.

/// `words` holds, per phrase word in original order, its slot offset within
/// the phrase and the record positions decoded from the posting metadata.
///
/// Position lists may be truncated prefixes of the real occurrence lists,
/// so a miss here can be a false negative; that is the storage contract.
pub(crate) fn phrase_matches(words: &[(u32, Vec<u32>)]) -> bool {
    let Some((first_offset, first_positions)) = words.first() else {
        return false;
    };
    for &position in first_positions {
        // The phrase would have to start this many slots before the first
        // word; positions before the text start cannot match.
        let Some(start) = position.checked_sub(*first_offset) else {
            continue;
        };
        let mut matched = true;
        for (offset, positions) in &words[1..] {
            if !positions.contains(&(start + offset)) {
                matched = false;
                break;
            }
        }
        if matched {
            return true;
        }
    }
    false
}
