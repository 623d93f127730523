//! Infrastructure Adapters - 出站端口实现

mod model;

pub use model::{
    FakeModelClient, FakeModelClientConfig, HttpModelClient, HttpModelClientConfig,
};
