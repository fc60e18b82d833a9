//! Single-screen controller owning the presentation state

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{get_message, Language};
use crate::model::{ImageUri, PredictionResult, Predictor};
use crate::picker::{ImagePicker, ImageSource, PickerOptions};

/// Presentation state of the prediction screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiState {
    pub selected_image_uri: Option<ImageUri>,
    pub is_loading: bool,
    pub label: Option<String>,
    pub confidence_text: Option<String>,
    pub error_message: Option<String>,
}

impl UiState {
    /// True for the canonical empty state
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of a user action on the controller
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    Predicted(PredictionResult),
    /// Prediction failed; carries the message placed in `error_message`
    PredictionFailed(String),
    /// Access was refused; carries the notice to show the user
    PermissionDenied { notice: String },
    Cancelled,
    /// The picker itself failed
    PickerFailed(String),
    /// Another attempt is still running
    Busy,
}

/// Configuration for the UiController
#[derive(Debug, Clone, Default)]
pub struct ControllerConfig {
    pub lang: Language,
    pub picker_options: PickerOptions,
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lang(mut self, lang: Language) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_picker_options(mut self, options: PickerOptions) -> Self {
        self.picker_options = options;
        self
    }
}

/// Marks one attempt as the active one. Dropping it releases the busy flag and
/// clears a loading state left behind when the attempt is dropped before it
/// settles, unless `on_clear` already handed the screen to a newer attempt.
struct FlightGuard<'a> {
    active: &'a AtomicU64,
    state: &'a watch::Sender<UiState>,
    id: u64,
}

impl FlightGuard<'_> {
    /// Still the attempt the screen belongs to
    fn is_current(&self) -> bool {
        self.active.load(Ordering::SeqCst) == self.id
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.is_current() {
            return;
        }
        if self.state.borrow().is_loading {
            self.state.send_modify(|s| s.is_loading = false);
        }
        let _ = self
            .active
            .compare_exchange(self.id, IDLE, Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// No attempt running
const IDLE: u64 = 0;

/// Sequences picker and prediction calls and reflects their outcome in
/// `UiState`.
///
/// The controller is the only writer of the state; renderers follow it through
/// [`UiController::subscribe`]. At most one attempt runs at a time. Clearing
/// the screen abandons the running attempt, so the next pick is accepted and
/// the abandoned result never reaches the state.
pub struct UiController<P, C> {
    picker: P,
    predictor: C,
    config: ControllerConfig,
    state: watch::Sender<UiState>,
    /// Id of the attempt owning the screen, `IDLE` when none
    active: AtomicU64,
    next_attempt: AtomicU64,
}

impl<P, C> UiController<P, C>
where
    P: ImagePicker,
    C: Predictor,
{
    pub fn new(picker: P, predictor: C, config: ControllerConfig) -> Self {
        let (state, _) = watch::channel(UiState::default());
        Self {
            picker,
            predictor,
            config,
            state,
            active: AtomicU64::new(IDLE),
            next_attempt: AtomicU64::new(IDLE + 1),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> UiState {
        self.state.borrow().clone()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Ask for access, launch the picker and predict on the selected image
    pub async fn on_pick_image(&self, source: ImageSource) -> PickOutcome {
        let Some(guard) = self.begin() else {
            warn!("Ignoring {} pick while a prediction is running", source.as_str());
            return PickOutcome::Busy;
        };

        let permission = self.picker.request_permission(source).await;
        if !permission.is_granted() {
            let notice = self.message(source.permission_message_key());
            warn!("Permission to access {} denied", source.as_str());
            return PickOutcome::PermissionDenied { notice };
        }

        let picked = self
            .picker
            .launch(source, &self.config.picker_options)
            .await;

        if !guard.is_current() {
            debug!("Screen was cleared while the {} picker was open", source.as_str());
            return PickOutcome::Cancelled;
        }

        let picked = match picked {
            Ok(picked) => picked,
            Err(e) => {
                warn!("Image picking error: {}", e);
                let message = self.message("select_failed");
                self.state.send_modify(|s| {
                    s.label = None;
                    s.confidence_text = None;
                    s.error_message = Some(message);
                });
                return PickOutcome::PickerFailed(e.to_string());
            }
        };

        let Some(uri) = picked.first_uri().cloned() else {
            debug!("Picker returned no image");
            return PickOutcome::Cancelled;
        };

        info!("Selected image {}", uri);
        let selected = uri.clone();
        self.state
            .send_modify(|s| s.selected_image_uri = Some(selected));

        self.run_prediction(&guard, &uri).await
    }

    /// Run the predict flow on an already selected image
    pub async fn predict(&self, uri: &ImageUri) -> PickOutcome {
        let Some(guard) = self.begin() else {
            warn!("Ignoring prediction request while another is running");
            return PickOutcome::Busy;
        };

        self.run_prediction(&guard, uri).await
    }

    /// Reset to the empty state, abandoning any running attempt
    pub fn on_clear(&self) {
        self.active.store(IDLE, Ordering::SeqCst);
        self.state.send_replace(UiState::default());
    }

    fn begin(&self) -> Option<FlightGuard<'_>> {
        let id = self.next_attempt.fetch_add(1, Ordering::SeqCst);
        self.active
            .compare_exchange(IDLE, id, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(FlightGuard {
            active: &self.active,
            state: &self.state,
            id,
        })
    }

    fn message(&self, key: &str) -> String {
        get_message(key, self.config.lang).to_string()
    }

    async fn run_prediction(&self, guard: &FlightGuard<'_>, uri: &ImageUri) -> PickOutcome {
        let predicting = self.message("predicting");

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.label = Some(predicting);
            s.confidence_text = None;
            s.error_message = None;
        });

        let outcome = self.predictor.predict(uri).await;

        if !guard.is_current() {
            debug!("Screen was cleared, discarding prediction for {}", uri);
            return match outcome {
                Ok(result) => PickOutcome::Predicted(result),
                Err(e) => PickOutcome::PredictionFailed(e.user_message()),
            };
        }

        match outcome {
            Ok(result) => {
                let label = result.label().to_string();
                let confidence = result.confidence_text();
                self.state.send_modify(|s| {
                    s.label = Some(label);
                    s.confidence_text = Some(confidence);
                    s.error_message = None;
                    s.is_loading = false;
                });
                PickOutcome::Predicted(result)
            }
            Err(e) => {
                warn!("Prediction error: {}", e);
                let message = e.user_message();
                let failed = self.message("prediction_failed");
                let error_message = message.clone();
                self.state.send_modify(|s| {
                    s.label = Some(failed);
                    s.confidence_text = None;
                    s.error_message = Some(error_message);
                    s.is_loading = false;
                });
                PickOutcome::PredictionFailed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PickerError, PredictionError, Result as PickerResultOf};
    use crate::picker::{PermissionStatus, PickedAsset, PickerResult};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct StubPicker {
        permission: PermissionStatus,
        result: Option<PickerResult>,
        launches: Arc<AtomicUsize>,
    }

    impl StubPicker {
        fn selecting(uri: &str) -> Self {
            Self {
                permission: PermissionStatus::Granted,
                result: Some(PickerResult::Selected(vec![PickedAsset {
                    uri: ImageUri::new(uri),
                    width: 256,
                    height: 256,
                }])),
                launches: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ImagePicker for StubPicker {
        async fn request_permission(&self, _source: ImageSource) -> PermissionStatus {
            self.permission
        }

        async fn launch(
            &self,
            _source: ImageSource,
            _options: &PickerOptions,
        ) -> PickerResultOf<PickerResult> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .ok_or_else(|| PickerError::CommandFailed("camera crashed".to_string()))
        }
    }

    struct StubPredictor {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Predictor for StubPredictor {
        async fn predict(
            &self,
            _image_uri: &ImageUri,
        ) -> std::result::Result<PredictionResult, PredictionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PredictionError::TransportError("connection refused".to_string()))
            } else {
                Ok(PredictionResult::new("Late_Blight", 91.2))
            }
        }
    }

    fn predictor(fail: bool) -> (StubPredictor, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            StubPredictor {
                calls: calls.clone(),
                fail,
            },
            calls,
        )
    }

    #[tokio::test]
    async fn test_pick_and_predict_success() {
        let (predictor, calls) = predictor(false);
        let controller = UiController::new(
            StubPicker::selecting("file:///tmp/leaf.jpg"),
            predictor,
            ControllerConfig::default(),
        );

        let outcome = controller.on_pick_image(ImageSource::Gallery).await;
        assert!(matches!(outcome, PickOutcome::Predicted(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let state = controller.state();
        assert_eq!(
            state.selected_image_uri,
            Some(ImageUri::new("file:///tmp/leaf.jpg"))
        );
        assert!(!state.is_loading);
        assert_eq!(state.label.as_deref(), Some("Late_Blight"));
        assert_eq!(state.confidence_text.as_deref(), Some("91.20"));
        assert_eq!(state.error_message, None);
    }

    #[tokio::test]
    async fn test_prediction_failure_sets_error() {
        let (predictor, _) = predictor(true);
        let controller = UiController::new(
            StubPicker::selecting("file:///tmp/leaf.jpg"),
            predictor,
            ControllerConfig::default(),
        );

        let outcome = controller.on_pick_image(ImageSource::Camera).await;
        assert_eq!(
            outcome,
            PickOutcome::PredictionFailed("connection refused".to_string())
        );

        let state = controller.state();
        assert!(!state.is_loading);
        assert_eq!(state.label.as_deref(), Some("Prediction failed"));
        assert_eq!(state.confidence_text, None);
        assert_eq!(state.error_message.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_permission_denied_leaves_state() {
        let (predictor, calls) = predictor(false);
        let mut picker = StubPicker::selecting("file:///tmp/leaf.jpg");
        picker.permission = PermissionStatus::Denied;
        let launches = picker.launches.clone();
        let controller = UiController::new(picker, predictor, ControllerConfig::default());

        let outcome = controller.on_pick_image(ImageSource::Camera).await;
        assert_eq!(
            outcome,
            PickOutcome::PermissionDenied {
                notice: "Permission to access camera is required!".to_string()
            }
        );
        assert_eq!(launches.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(controller.state().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_pick_is_silent() {
        let (predictor, calls) = predictor(false);
        let mut picker = StubPicker::selecting("unused");
        picker.result = Some(PickerResult::Cancelled);
        let controller = UiController::new(picker, predictor, ControllerConfig::default());

        assert_eq!(
            controller.on_pick_image(ImageSource::Gallery).await,
            PickOutcome::Cancelled
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(controller.state().is_empty());
    }

    #[tokio::test]
    async fn test_picker_failure_sets_select_message() {
        let (predictor, calls) = predictor(false);
        let mut picker = StubPicker::selecting("unused");
        picker.result = None;
        let controller = UiController::new(picker, predictor, ControllerConfig::default());

        let outcome = controller.on_pick_image(ImageSource::Camera).await;
        assert!(matches!(outcome, PickOutcome::PickerFailed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let state = controller.state();
        assert_eq!(state.error_message.as_deref(), Some("Failed to select image"));
        assert_eq!(state.selected_image_uri, None);
        assert!(!state.is_loading);
    }

    /// Picker that succeeds once and then fails
    struct FlakyPicker {
        launches: AtomicUsize,
    }

    #[async_trait]
    impl ImagePicker for FlakyPicker {
        async fn request_permission(&self, _source: ImageSource) -> PermissionStatus {
            PermissionStatus::Granted
        }

        async fn launch(
            &self,
            _source: ImageSource,
            _options: &PickerOptions,
        ) -> PickerResultOf<PickerResult> {
            if self.launches.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(PickerResult::Selected(vec![PickedAsset {
                    uri: ImageUri::new("file:///tmp/a.jpg"),
                    width: 256,
                    height: 256,
                }]))
            } else {
                Err(PickerError::CommandFailed("camera crashed".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn test_picker_failure_hides_previous_result() {
        let (predictor, _) = predictor(false);
        let controller = UiController::new(
            FlakyPicker {
                launches: AtomicUsize::new(0),
            },
            predictor,
            ControllerConfig::default(),
        );

        controller.on_pick_image(ImageSource::Gallery).await;
        assert_eq!(controller.state().label.as_deref(), Some("Late_Blight"));

        let outcome = controller.on_pick_image(ImageSource::Camera).await;
        assert!(matches!(outcome, PickOutcome::PickerFailed(_)));

        let state = controller.state();
        assert_eq!(state.error_message.as_deref(), Some("Failed to select image"));
        assert_eq!(state.label, None);
        assert_eq!(state.confidence_text, None);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_clear_resets_state() {
        let (predictor, _) = predictor(false);
        let controller = UiController::new(
            StubPicker::selecting("file:///tmp/leaf.jpg"),
            predictor,
            ControllerConfig::default(),
        );

        controller.on_pick_image(ImageSource::Gallery).await;
        assert!(!controller.state().is_empty());

        controller.on_clear();
        assert!(controller.state().is_empty());
    }

    #[tokio::test]
    async fn test_french_labels() {
        let (predictor, _) = predictor(true);
        let controller = UiController::new(
            StubPicker::selecting("file:///tmp/leaf.jpg"),
            predictor,
            ControllerConfig::new().with_lang(Language::French),
        );

        controller.on_pick_image(ImageSource::Gallery).await;
        assert_eq!(
            controller.state().label.as_deref(),
            Some("Échec de la prédiction")
        );
    }

    #[test]
    fn test_dropped_guard_clears_loading() {
        let (state, _) = watch::channel(UiState::default());
        let active = AtomicU64::new(7);
        state.send_modify(|s| s.is_loading = true);

        drop(FlightGuard {
            active: &active,
            state: &state,
            id: 7,
        });

        assert!(!state.borrow().is_loading);
        assert_eq!(active.load(Ordering::SeqCst), IDLE);
    }

    #[test]
    fn test_abandoned_guard_leaves_newer_attempt_alone() {
        let (state, _) = watch::channel(UiState::default());
        let active = AtomicU64::new(9);
        state.send_modify(|s| s.is_loading = true);

        drop(FlightGuard {
            active: &active,
            state: &state,
            id: 7,
        });

        assert!(state.borrow().is_loading);
        assert_eq!(active.load(Ordering::SeqCst), 9);
    }
}
