// In crates/oracle/src/stability.rs

use std::future::Future;
use std::time::Duration;

use crate::{Error, Result};

/// Polls `observe` until it yields the same non-empty text twice in a row.
///
/// Streaming or hand-typed replies keep changing for a while; a reply is
/// considered complete once it stops changing between two polls that are
/// `interval` apart. Gives up with `Error::Timeout` after `max_polls`
/// observations.
pub async fn wait_until_stable<F, Fut>(
    mut observe: F,
    interval: Duration,
    max_polls: u32,
) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    let mut previous: Option<String> = None;

    for poll in 1..=max_polls {
        let current = observe().await?.filter(|text| !text.trim().is_empty());

        if let Some(text) = &current {
            if previous.as_deref() == Some(text.as_str()) {
                tracing::debug!(poll, "Reply is stable.");
                return Ok(text.clone());
            }
        }
        previous = current;

        if poll < max_polls {
            tokio::time::sleep(interval).await;
        }
    }

    Err(Error::Timeout { polls: max_polls })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn script(observations: &[Option<&str>]) -> VecDeque<Option<String>> {
        observations.iter().map(|o| o.map(str::to_string)).collect()
    }

    #[tokio::test]
    async fn returns_once_text_stops_changing() {
        let mut seen = script(&[None, Some("BU"), Some("BUY, the trend"), Some("BUY, the trend"), Some("late")]);

        let text = wait_until_stable(
            || {
                let next = seen.pop_front().flatten();
                async move { Ok::<_, Error>(next) }
            },
            Duration::from_millis(1),
            10,
        )
        .await
        .unwrap();

        assert_eq!(text, "BUY, the trend");
    }

    #[tokio::test]
    async fn blank_text_never_counts_as_stable() {
        let mut calls = 0u32;
        let err = wait_until_stable(
            || {
                calls += 1;
                async { Ok::<_, Error>(Some("   ".to_string())) }
            },
            Duration::from_millis(1),
            4,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Timeout { polls: 4 }));
        assert_eq!(calls, 4);
    }

    #[tokio::test]
    async fn observation_errors_abort_the_wait() {
        let err = wait_until_stable(
            || async { Err::<Option<String>, _>(Error::InputClosed) },
            Duration::from_millis(1),
            3,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::InputClosed));
    }
}
