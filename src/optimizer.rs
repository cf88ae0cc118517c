//! Optimize CSS assets.

use std::sync::Arc;

use crate::{
    asset::CssAsset,
    config::Config,
    css::{import::ImportResolver, load::load_stylesheet, minify::Minifier},
    error::Result,
    generator::UrlGenerator,
    provider::{FileProvider, SourceProvider},
};

/// Minifies stylesheets and inlines their imports.
///
/// The optimizer holds no state between calls: the same instance can
/// optimize assets from several threads.
#[derive(Clone)]
pub struct CssOptimizer<P = FileProvider> {
    config: Config,
    provider: P,
    url_generator: Arc<dyn UrlGenerator>,
}

impl CssOptimizer<FileProvider> {
    /// Create an optimizer reading files under [`Config::root_dir`].
    pub fn new(config: Config, url_generator: impl UrlGenerator + 'static) -> Self {
        let provider = FileProvider::new(&config.root_dir);
        Self::with_provider(config, provider, url_generator)
    }
}

impl<P> CssOptimizer<P>
where
    P: SourceProvider,
{
    /// Create an optimizer reading stylesheets from a custom provider.
    pub fn with_provider(
        config: Config,
        provider: P,
        url_generator: impl UrlGenerator + 'static,
    ) -> Self {
        Self {
            config,
            provider,
            url_generator: Arc::new(url_generator),
        }
    }

    /// Return the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Return the source provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Optimize a CSS asset and return the minified code.
    ///
    /// The stylesheet is decoded, its imports are inlined and the result is
    /// minified. Relative urls are rewritten with the [`UrlGenerator`].
    pub fn optimize(&self, asset: &CssAsset) -> Result<String> {
        asset.check()?;

        let path = asset.url_path();
        tracing::info!("Optimizing {}", path);

        let stylesheet = load_stylesheet(&self.provider, &path)?;

        let text = ImportResolver::new(&self.provider, self.config.max_import_depth)
            .resolve(&path, &stylesheet.text)?;

        Minifier::new()
            .rewrite_urls(self.url_generator.as_ref(), stylesheet.base_dir)
            .strict(self.config.strict, path)
            .minify(&text)
    }
}

impl<P> std::fmt::Debug for CssOptimizer<P>
where
    P: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CssOptimizer")
            .field("config", &self.config)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}
