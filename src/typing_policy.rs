/// How a new input value differs from the previous one.
///
/// Input arrives as the whole text field, so edits are recovered by
/// comparing against what was there before. Anything after the common
/// prefix in the old value counts as deleted; anything after it in the new
/// value counts as appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputChange {
    pub removed: usize,
    /// (character index, character) for each appended character
    pub appended: Vec<(usize, char)>,
}

impl InputChange {
    pub fn is_noop(&self) -> bool {
        self.removed == 0 && self.appended.is_empty()
    }

    /// Pure deletions never count as keystrokes
    pub fn is_deletion_only(&self) -> bool {
        self.removed > 0 && self.appended.is_empty()
    }
}

pub fn diff_input(previous: &str, next: &str) -> InputChange {
    let common = previous
        .chars()
        .zip(next.chars())
        .take_while(|(a, b)| a == b)
        .count();

    InputChange {
        removed: previous.chars().count() - common,
        appended: next.chars().enumerate().skip(common).collect(),
    }
}
