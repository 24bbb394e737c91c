use serde::{Deserialize, Serialize};

/// One detected object, in normalized image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub class: String,
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
}

/// Result of one backend prediction, as returned by `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub prediction_id: String,
    pub original_img_path: String,
    pub predicted_img_path: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Unix timestamp in seconds.
    pub time: f64,
}

/// Count labels per class, in the order each class first appears.
pub fn count_objects(labels: &[Label]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|(class, _)| *class == label.class) {
            Some((_, n)) => *n += 1,
            None => counts.push((label.class.clone(), 1)),
        }
    }
    counts
}

/// `"<Class>: <count>\n"` per class, class names capitalised.
pub fn format_counts(counts: &[(String, usize)]) -> String {
    counts
        .iter()
        .map(|(class, n)| format!("{}: {n}\n", capitalize(class)))
        .collect()
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
