use std::collections::HashSet;

use super::detection::Detection;

/// Conserva, en el orden de emisión, las detecciones con confianza
/// estrictamente mayor que `threshold`.
pub fn filter_confident(detections: &[Detection], threshold: f32) -> Vec<Detection> {
    detections
        .iter()
        .filter(|det| det.score > threshold)
        .cloned()
        .collect()
}

/// Reduce las detecciones a la lista de etiquetas distintas, en orden de
/// primera aparición. Las repeticiones posteriores se descartan aunque
/// tengan más confianza.
pub fn unique_labels(detections: &[Detection]) -> Vec<String> {
    dedup_labels(detections.iter().map(|det| det.label.as_str()))
}

pub fn dedup_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .filter(|label| seen.insert(*label))
        .map(str::to_string)
        .collect()
}

/// "2 person, 1 dog": conteo por etiqueta en orden de primera aparición.
pub fn summarize_detections(detections: &[Detection]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for det in detections {
        match counts.iter_mut().find(|(label, _)| *label == det.label) {
            Some((_, n)) => *n += 1,
            None => counts.push((det.label.as_str(), 1)),
        }
    }
    counts
        .iter()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}
