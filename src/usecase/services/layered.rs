#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Request,
    Persisted,
    Configured,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub layer: Layer,
}

type Source<'a, T> = Box<dyn FnOnce() -> Option<T> + 'a>;

pub struct LayeredResolver<'a, T> {
    sources: Vec<(Layer, Source<'a, T>)>,
}

impl<'a, T> Default for LayeredResolver<'a, T> {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
        }
    }
}

impl<'a, T> LayeredResolver<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer<F>(mut self, layer: Layer, source: F) -> Self
    where
        F: FnOnce() -> Option<T> + 'a,
    {
        self.sources.push((layer, Box::new(source)));
        self
    }

    pub fn resolve(self) -> Option<Resolved<T>> {
        self.sources
            .into_iter()
            .find_map(|(layer, source)| source().map(|value| Resolved { value, layer }))
    }

    pub fn value(self) -> Option<T> {
        self.resolve().map(|resolved| resolved.value)
    }
}
