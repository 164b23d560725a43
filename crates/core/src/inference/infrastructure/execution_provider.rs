/// Execution providers for inference sessions on the current platform.
///
/// An empty list leaves ONNX Runtime on its default CPU provider; registered
/// providers that fail to initialize also fall back to CPU.
pub fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    fn test_cpu_platforms_register_no_extra_provider() {
        assert!(preferred_execution_providers().is_empty());
    }

    #[test]
    #[cfg(any(target_os = "macos", target_os = "windows"))]
    fn test_accelerated_platforms_register_one_provider() {
        assert_eq!(preferred_execution_providers().len(), 1);
    }
}
