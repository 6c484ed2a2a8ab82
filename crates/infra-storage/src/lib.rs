// Credent Infrastructure - Storage Adapters
// Implements: ContainerStore, MailSender (outbox), StorageProbe

pub mod fs_container_store;
pub mod outbox_mailer;
pub mod storage_probe_impl;

pub use fs_container_store::FsContainerStore;
pub use outbox_mailer::OutboxMailSender;
pub use storage_probe_impl::StorageProbeImpl;
