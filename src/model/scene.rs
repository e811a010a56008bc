use crate::model::light::LightManager;
use crate::model::renderable::Renderable;

/// Everything that gets drawn: renderables in insertion order plus the lights.
pub struct Scene {
    renderables: Vec<Renderable>,
    pub lights: LightManager,
}

impl Scene {
    pub fn new(lights: LightManager) -> Self {
        Self { renderables: Vec::new(), lights }
    }

    /// Returns the index the renderable was stored at.
    pub fn add(&mut self, renderable: Renderable) -> usize {
        tracing::info!("adding renderable '{}'", renderable.name());
        self.renderables.push(renderable);
        self.renderables.len() - 1
    }

    /// Remove and drop (releasing its GPU buffers) the renderable at `index`.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.renderables.len() {
            return false;
        }
        let removed = self.renderables.remove(index);
        tracing::info!("removed renderable '{}'", removed.name());
        true
    }

    pub fn clear(&mut self) {
        if !self.renderables.is_empty() {
            tracing::debug!("releasing {} renderables", self.renderables.len());
        }
        self.renderables.clear();
    }

    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }

    pub fn renderables(&self) -> &[Renderable] {
        &self.renderables
    }

    pub fn renderables_mut(&mut self) -> &mut [Renderable] {
        &mut self.renderables
    }
}
