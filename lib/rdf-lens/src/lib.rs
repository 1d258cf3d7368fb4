#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod model {
    pub use rdf_lens_model::*;
}

pub mod engine {
    pub use rdf_lens_common::*;
}

pub mod projection {
    pub use rdf_lens_projection::*;
}

pub mod visual {
    pub use rdf_lens_visual::*;
}

pub mod pipeline {
    pub use rdf_lens_pipeline::*;
}

pub mod sources {
    pub use rdf_lens_sources::*;
}
