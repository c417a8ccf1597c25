//! Use case implementations.

mod preview_folder_use_case;

pub use preview_folder_use_case::PreviewFolderUseCase;
