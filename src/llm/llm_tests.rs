//! Unit tests for the LLM client and queue.

#[cfg(test)]
mod llm_tests {
    use crate::llm::{LLMClient, LLMQueue, Priority};

    #[test]
    fn test_priority_purpose() {
        assert_eq!(Priority::High.purpose(), "translation");
        assert_eq!(Priority::Normal.purpose(), "explanation");
    }

    #[tokio::test]
    async fn test_client_without_models_fails() {
        let client = LLMClient::new("test-key".to_string(), None, Vec::new());
        let err = client.chat("system", "hello").await.unwrap_err();
        assert!(err.to_string().contains("no LLM models configured"));
    }

    #[tokio::test]
    async fn test_queue_passes_client_errors_back() {
        let client = LLMClient::new("test-key".to_string(), None, Vec::new());
        let queue = LLMQueue::new(client, 1, 4);
        let err = queue.chat("system", "hello", Priority::High).await.unwrap_err();
        assert!(err.to_string().contains("no LLM models configured"));
    }
}
