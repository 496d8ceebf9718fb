//! Main CASC storage implementation

mod casc_storage;

pub use casc_storage::{
    FileHandle, FindEntry, FindIter, OpenFlags, OpenTarget, Storage, StorageInfo,
};
