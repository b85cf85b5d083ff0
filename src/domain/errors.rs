use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// La petición no trae ninguna imagen.
    #[error("No image file provided")]
    MissingInput,
    /// Los bytes recibidos no se pueden interpretar como imagen.
    #[error("Failed to decode image: {0}")]
    Decode(String),
    /// La subida supera el límite configurado (en bytes).
    #[error("Image exceeds upload limit of {0} bytes")]
    PayloadTooLarge(usize),
    /// El detector falló o devolvió un resultado inutilizable.
    #[error("{0}")]
    DetectionFailure(String),
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_message_is_stable() {
        assert_eq!(DomainError::MissingInput.to_string(), "No image file provided");
    }

    #[test]
    fn detection_failure_carries_message_verbatim() {
        let err = DomainError::DetectionFailure("output tensor has rank 2".into());
        assert_eq!(err.to_string(), "output tensor has rank 2");
    }

    #[test]
    fn payload_too_large_names_the_limit() {
        assert_eq!(
            DomainError::PayloadTooLarge(1024).to_string(),
            "Image exceeds upload limit of 1024 bytes"
        );
    }
}
