use std::collections::VecDeque;

use crux_core::Core;
use shared::image_processing::ImageProcessor;
use shared::{App, Capabilities, Effect, Event, IssueId, ViewModel};
use tracing::trace;

use crate::transport::Transport;

/// Drives the core, executing its effects one at a time until it goes idle.
pub struct Shell<T> {
    core: Core<Effect, App>,
    transport: T,
    images: ImageProcessor,
    renders: usize,
}

impl<T: Transport> Shell<T> {
    pub fn new(transport: T, images: ImageProcessor) -> Self {
        Self {
            core: Core::new::<Capabilities>(),
            transport,
            images,
            renders: 0,
        }
    }

    /// Processes `event` and every follow-up event its effects produce.
    pub async fn dispatch(&mut self, event: Event) {
        let effects = self.core.process_event(event);
        self.run_until_idle(effects).await;
    }

    async fn run_until_idle(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            let next = match effect {
                Effect::Render(_) => {
                    self.renders += 1;
                    trace!(renders = self.renders, "render requested");
                    continue;
                }
                Effect::Http(mut request) => {
                    let output = self.transport.execute(&request.operation).await;
                    self.core.resolve(&mut request, output)
                }
                Effect::ImageEncoder(mut request) => {
                    let output = self.images.execute(request.operation.clone()).await;
                    self.core.resolve(&mut request, output)
                }
            };
            queue.extend(next);
        }
    }

    #[must_use]
    pub fn view(&self) -> ViewModel {
        self.core.view()
    }

    /// True while the detail panel shows `issue_id`.
    #[must_use]
    pub fn is_panel_open_for(&self, issue_id: IssueId) -> bool {
        self.view()
            .detail
            .is_some_and(|detail| detail.id == issue_id)
    }

    #[must_use]
    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
