use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use polybot_core::IncomingMessage;
use polybot_detect::{
    count_objects, format_counts, DetectionBackend, ObjectStore, PredictionStore,
};

use super::{download_user_photo, echo, run_guarded, MessageHandler, Outcome};
use crate::error::HandlerError;
use crate::guard::SessionGuard;
use crate::transport::Transport;

pub const NO_PREDICTIONS: &str = "No predictions found, please try upload another image contains some of the following list objects: https://github.com/ultralytics/yolov5/discussions/7370";

/// Collaborators of the object-detection bot.
#[derive(Clone)]
pub struct DetectionServices {
    pub backend: Arc<dyn DetectionBackend>,
    pub storage: Arc<dyn ObjectStore>,
    /// Where summaries are recorded. Optional; detection works without it.
    pub predictions: Option<Arc<dyn PredictionStore>>,
    /// Key prefix photos are uploaded under.
    pub upload_prefix: String,
}

/// Uploads each photo, asks the backend what is in it, and replies with counts.
pub struct ObjectDetectionBot {
    transport: Arc<dyn Transport>,
    services: DetectionServices,
    guard: SessionGuard,
    timeout: Duration,
}

impl ObjectDetectionBot {
    pub fn new(transport: Arc<dyn Transport>, services: DetectionServices, timeout: Duration) -> Self {
        Self {
            transport,
            services,
            guard: SessionGuard::new(),
            timeout,
        }
    }

    pub async fn process(&self, msg: &IncomingMessage) -> Result<(), HandlerError> {
        if !msg.is_photo() {
            return echo(self.transport.as_ref(), msg).await;
        }

        let photo = download_user_photo(self.transport.as_ref(), msg, 0).await?;
        let key = format!(
            "{}/{}",
            self.services.upload_prefix.trim_end_matches('/'),
            photo.remote_path
        );

        self.services
            .storage
            .upload(&photo.path, &key)
            .await
            .map_err(HandlerError::Storage)?;

        let Some(summary) = self
            .services
            .backend
            .predict(&key)
            .await
            .map_err(HandlerError::Detection)?
        else {
            info!(chat_id = msg.chat_id, key = %key, "no objects detected");
            self.transport.send_text(msg.chat_id, NO_PREDICTIONS).await?;
            return Ok(());
        };

        info!(
            chat_id = msg.chat_id,
            prediction_id = %summary.prediction_id,
            labels = summary.labels.len(),
            "prediction received"
        );

        if let Some(ref store) = self.services.predictions {
            if let Err(e) = store.save(&summary) {
                warn!(prediction_id = %summary.prediction_id, error = %e, "failed to store prediction");
            }
        }

        let counts = count_objects(&summary.labels);
        self.transport
            .send_text(
                msg.chat_id,
                &format!("Predicted Objects: \n{}", format_counts(&counts)),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for ObjectDetectionBot {
    fn name(&self) -> &'static str {
        "object-detection"
    }

    async fn handle(&self, msg: &IncomingMessage) -> Outcome {
        run_guarded(
            &self.guard,
            self.timeout,
            self.transport.as_ref(),
            msg,
            |_permit| self.process(msg),
        )
        .await
    }

    fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::FakeTransport;
    use polybot_core::PhotoRef;
    use polybot_detect::{DetectError, Label, PredictionSummary};

    #[derive(Default)]
    struct FakeStorage {
        keys: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ObjectStore for FakeStorage {
        async fn upload(&self, local: &Path, key: &str) -> Result<(), DetectError> {
            assert!(local.exists());
            if self.fail {
                return Err(DetectError::Api {
                    service: "s3",
                    status: 403,
                    message: "denied".into(),
                });
            }
            self.keys.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }

    struct FakeBackend {
        result: Option<PredictionSummary>,
        asked: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DetectionBackend for FakeBackend {
        async fn predict(&self, img_name: &str) -> Result<Option<PredictionSummary>, DetectError> {
            self.asked.lock().unwrap().push(img_name.to_string());
            Ok(self.result.clone())
        }
    }

    #[derive(Default)]
    struct FakePredictions {
        saved: Mutex<Vec<String>>,
    }

    impl PredictionStore for FakePredictions {
        fn save(&self, summary: &PredictionSummary) -> Result<(), DetectError> {
            self.saved.lock().unwrap().push(summary.prediction_id.clone());
            Ok(())
        }
    }

    fn summary(classes: &[&str]) -> PredictionSummary {
        PredictionSummary {
            prediction_id: "p1".into(),
            original_img_path: "photos/a.png".into(),
            predicted_img_path: "static/p1/a.png".into(),
            labels: classes
                .iter()
                .map(|c| Label {
                    class: c.to_string(),
                    cx: 0.5,
                    cy: 0.5,
                    width: 0.1,
                    height: 0.1,
                })
                .collect(),
            time: 1.0,
        }
    }

    struct Fixture {
        transport: Arc<FakeTransport>,
        storage: Arc<FakeStorage>,
        backend: Arc<FakeBackend>,
        predictions: Arc<FakePredictions>,
        bot: ObjectDetectionBot,
    }

    fn fixture(result: Option<PredictionSummary>, storage_fails: bool) -> Fixture {
        let transport = Arc::new(FakeTransport::new());
        let storage = Arc::new(FakeStorage {
            fail: storage_fails,
            ..FakeStorage::default()
        });
        let backend = Arc::new(FakeBackend {
            result,
            asked: Mutex::new(Vec::new()),
        });
        let predictions = Arc::new(FakePredictions::default());
        let services = DetectionServices {
            backend: backend.clone(),
            storage: storage.clone(),
            predictions: Some(predictions.clone()),
            upload_prefix: "telegram_photos/".into(),
        };
        let bot = ObjectDetectionBot::new(transport.clone(), services, Duration::from_secs(10));
        Fixture {
            transport,
            storage,
            backend,
            predictions,
            bot,
        }
    }

    fn photo(id: &str) -> IncomingMessage {
        IncomingMessage::photo(3, 1, None, vec![PhotoRef::new(id)])
    }

    #[tokio::test]
    async fn counts_are_reported_and_stored() {
        let f = fixture(Some(summary(&["person", "dog", "person"])), false);
        let outcome = f.bot.handle(&photo("a")).await;
        assert_eq!(outcome, Outcome::Handled);

        assert_eq!(
            *f.storage.keys.lock().unwrap(),
            vec!["telegram_photos/photos/a.png".to_string()]
        );
        assert_eq!(
            *f.backend.asked.lock().unwrap(),
            vec!["telegram_photos/photos/a.png".to_string()]
        );
        assert_eq!(*f.predictions.saved.lock().unwrap(), vec!["p1".to_string()]);
        assert_eq!(
            f.transport.texts(),
            vec!["Predicted Objects: \nPerson: 2\nDog: 1\n".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_prediction_sends_object_list_hint() {
        let f = fixture(None, false);
        f.bot.handle(&photo("a")).await;
        assert_eq!(f.transport.texts(), vec![NO_PREDICTIONS.to_string()]);
        assert!(f.predictions.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_failure_is_transient_and_skips_detection() {
        let f = fixture(Some(summary(&["cat"])), true);
        let outcome = f.bot.handle(&photo("a")).await;
        assert_eq!(outcome, Outcome::Failed(ErrorKind::Transient));
        assert!(f.backend.asked.lock().unwrap().is_empty());
        assert_eq!(
            f.transport.texts(),
            vec!["An error occurred while processing your request.".to_string()]
        );
        assert!(!f.bot.is_busy());
    }

    #[tokio::test]
    async fn text_is_echoed() {
        let f = fixture(None, false);
        f.bot.handle(&IncomingMessage::text(3, 2, "yo")).await;
        assert_eq!(
            f.transport.texts(),
            vec!["Your original message: yo".to_string()]
        );
        assert_eq!(f.transport.download_count(), 0);
    }
}
