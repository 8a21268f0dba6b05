use super::text::SEMICOLON_LIST;
use super::{BlockView, Normalized};
use crate::import::records::CollectionRecord;
use crate::sheet::TableBlock;

const RENAMES: &[(&str, &str)] = &[("description", "poemCollectionDescription")];

const FIELDS: &[&str] = &["poemCollectionName", "poemCollectionDescription"];

pub fn normalize_collections(block: &TableBlock) -> Normalized<CollectionRecord> {
    let view = BlockView::new(block, RENAMES, FIELDS);
    let mut out = Normalized::default();

    for row in view.rows() {
        let names = view.list(row, "poemCollectionName", SEMICOLON_LIST);
        if names.is_empty() {
            out.skip(row, "collection has no name");
            continue;
        }

        out.push(
            row,
            CollectionRecord {
                names,
                description: view.text(row, "poemCollectionDescription"),
            },
        );
    }

    out
}
