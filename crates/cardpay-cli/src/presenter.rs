use cardpay_connection::{ModalPresenter, ModalSurface, PresentationRequest};
use cardpay_onboarding::{OnboardingPresenter, OnboardingReadiness};
use tracing::info;

/// Renders alerts and onboarding as log lines.
#[derive(Debug, Default)]
pub struct TracingPresenter;

fn describe(request: &PresentationRequest) -> String {
    let mut text = request.title.clone();

    if let Some(message) = &request.message {
        text.push_str(": ");
        text.push_str(message);
    }

    for (index, reader) in request.readers.iter().enumerate() {
        text.push_str(&format!("\n  [{}] {} ({})", index, reader.display_name(), reader.id));
    }

    let buttons: Vec<_> = [&request.primary_action, &request.secondary_action]
        .into_iter()
        .flatten()
        .map(|button| format!("[{}]", button.label))
        .collect();
    if !buttons.is_empty() {
        text.push_str(&format!("\n  {}", buttons.join(" ")));
    }

    text
}

impl ModalPresenter for TracingPresenter {
    fn present(&mut self, request: &PresentationRequest) {
        info!(surface = ?request.surface, "present {}", describe(request));
    }

    fn update(&mut self, request: &PresentationRequest) {
        info!(surface = ?request.surface, "update {}", describe(request));
    }

    fn dismiss(&mut self, surface: ModalSurface) {
        info!(surface = ?surface, "dismiss");
    }
}

impl OnboardingPresenter for TracingPresenter {
    fn present_onboarding(&mut self, readiness: &OnboardingReadiness) {
        info!("Onboarding required: {}", readiness);
    }

    fn dismiss_onboarding(&mut self) {
        info!("Onboarding complete");
    }
}
