use crate::domain::detection::Detection;

/// Informe legible de una detección, dos líneas por objeto.
pub fn describe_detection(det: &Detection) -> String {
    format!(
        "Detected: {} (confidence: {:.2})\nLocation: ({:.0}, {:.0}) to ({:.0}, {:.0})",
        det.label, det.score, det.x1, det.y1, det.x2, det.y2
    )
}

pub fn detection_report(detections: &[Detection]) -> String {
    if detections.is_empty() {
        return "No objects detected.".to_string();
    }
    detections
        .iter()
        .map(describe_detection)
        .collect::<Vec<_>>()
        .join("\n")
}
