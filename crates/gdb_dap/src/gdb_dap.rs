mod delegate;
mod descriptor_factory;
mod extension;
mod notifications;
mod resolver;
mod settings;

pub use delegate::*;
pub use descriptor_factory::*;
pub use extension::*;
pub use notifications::*;
pub use resolver::*;
pub use settings::*;

#[cfg(test)]
#[ctor::ctor]
fn init_logger() {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
    }
}
