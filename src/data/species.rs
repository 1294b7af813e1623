use serde::{Deserialize, Serialize};

/// The three iris species, in class-index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Setosa,
    Versicolor,
    Virginica,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Setosa, Species::Versicolor, Species::Virginica];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Species> {
        Species::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Setosa => "setosa",
            Species::Versicolor => "versicolor",
            Species::Virginica => "virginica",
        }
    }

    /// Resolves a free-form label by case-insensitive substring match, so
    /// "Iris-setosa" and "I. Versicolor" both resolve. The first species in
    /// class order that matches wins.
    pub fn from_label(label: &str) -> Option<Species> {
        let label = label.trim().to_lowercase();
        Species::ALL.iter().copied().find(|s| label.contains(s.name()))
    }

    pub fn one_hot(self) -> Vec<f64> {
        let mut v = vec![0.0; Species::ALL.len()];
        v[self.index()] = 1.0;
        v
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_common_spellings() {
        assert_eq!(Species::from_label("Iris-setosa"), Some(Species::Setosa));
        assert_eq!(Species::from_label("  VERSICOLOR "), Some(Species::Versicolor));
        assert_eq!(Species::from_label("iris virginica"), Some(Species::Virginica));
        assert_eq!(Species::from_label("daisy"), None);
        assert_eq!(Species::from_label(""), None);
    }

    #[test]
    fn one_hot_marks_the_class_index() {
        assert_eq!(Species::Versicolor.one_hot(), vec![0.0, 1.0, 0.0]);
        assert_eq!(Species::from_index(2), Some(Species::Virginica));
        assert_eq!(Species::from_index(3), None);
    }
}
