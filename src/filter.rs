//! Classification of picker results into folders and eligible script files.

use crate::models::PickedDoc;

/// MIME type marking an item as a Drive folder container.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type of Python script files.
pub const PYTHON_FILE_MIME_TYPE: &str = "text/x-python";

/// Recognized script file extension.
pub const PYTHON_FILE_EXTENSION: &str = ".py";

/// Whether a MIME type marks a Drive folder.
pub fn is_folder(mime_type: &str) -> bool {
    mime_type == FOLDER_MIME_TYPE
}

/// Whether an item is a script file worth downloading.
///
/// Matches a `.py` name suffix, the script MIME type, or an empty MIME type
/// (the item's type could not be determined, so it is included permissively).
pub fn is_eligible_script(name: &str, mime_type: &str) -> bool {
    name.ends_with(PYTHON_FILE_EXTENSION)
        || mime_type == PYTHON_FILE_MIME_TYPE
        || mime_type.is_empty()
}

/// A picker selection partitioned into folders and eligible files.
#[derive(Debug, Default)]
pub struct Selection {
    pub folders: Vec<PickedDoc>,
    pub files: Vec<PickedDoc>,
}

/// Partition picked items into folders and eligible script files.
///
/// Non-folder items that fail the eligibility predicate are dropped.
pub fn partition_selection(docs: Vec<PickedDoc>) -> Selection {
    let mut selection = Selection::default();

    for doc in docs {
        if is_folder(&doc.mime_type) {
            selection.folders.push(doc);
        } else if is_eligible_script(&doc.name, &doc.mime_type) {
            selection.files.push(doc);
        }
    }

    selection
}
