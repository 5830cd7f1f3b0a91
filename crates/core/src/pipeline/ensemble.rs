//! Concurrent ensemble calls.

use futures::future::join_all;
use tracing::warn;

use super::error::StageError;
use super::ports::TextGenerator;

/// Issues `calls` identical requests concurrently and waits for all of them.
///
/// A failed call yields `None` in its position and counts as an empty vote.
/// If every call fails the item fails with the first error.
pub async fn gather<G: TextGenerator>(
    generator: &G,
    prompt: &str,
    calls: usize,
) -> Result<Vec<Option<String>>, StageError> {
    let results = join_all((0..calls).map(|_| generator.generate(prompt))).await;

    let mut replies = Vec::with_capacity(results.len());
    let mut first_error = None;
    for (call, result) in results.into_iter().enumerate() {
        match result {
            Ok(reply) => replies.push(Some(reply)),
            Err(err) => {
                warn!(call, error = %err, "ensemble call failed");
                first_error.get_or_insert(err);
                replies.push(None);
            }
        }
    }

    if replies.iter().all(Option::is_none)
        && let Some(err) = first_error
    {
        return Err(err.into());
    }
    Ok(replies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::GenerationError;
    use crate::pipeline::testing::ScriptedGenerator;

    #[tokio::test]
    async fn test_failed_calls_become_empty_votes() {
        let generator = ScriptedGenerator::new([
            Ok("a".to_string()),
            Err(GenerationError::Transport("reset".into())),
            Ok("b".to_string()),
        ]);
        let replies = gather(&generator, "prompt", 3).await.expect("partial success");
        assert_eq!(replies, vec![Some("a".to_string()), None, Some("b".to_string())]);
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn test_all_calls_failing_is_external_failure() {
        let generator = ScriptedGenerator::new([
            Err(GenerationError::Status {
                status: 503,
                body: "unavailable".into(),
            }),
            Err(GenerationError::Transport("reset".into())),
        ]);
        let err = gather(&generator, "prompt", 2).await.unwrap_err();
        assert!(matches!(err, StageError::ExternalService(ref msg) if msg.contains("503")));
    }
}
