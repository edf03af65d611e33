/*!
 * Folder watching.
 *
 * - `queue`: single-flight FIFO with per-directory "seen" sets
 * - `watcher`: `notify` based change detection, used only as a rescan trigger
 * - `service`: the dispatcher task that turns detected files into jobs
 */

pub mod queue;
pub mod service;
pub mod watcher;

pub use queue::{Offer, WatchQueue};
pub use service::{WatchEvent, WatchHandle, WatchService};
pub use watcher::FolderWatcher;
