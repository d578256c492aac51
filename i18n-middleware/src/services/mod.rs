pub mod detection;
pub mod loader;
pub mod resolver;
pub mod rewrite;

pub use detection::{Candidate, DetectOptions, DetectionSource, DetectorFn, LocaleMethod};
pub use loader::LocaleLoader;
pub use resolver::{Resolution, ResolvedBy, SourceCandidate, resolve};
pub use rewrite::{PathRewriter, UnrewrittenUri};
