use super::text::split_name;
use super::{BlockView, Normalized};
use crate::import::records::PoetRecord;
use crate::sheet::TableBlock;

const RENAMES: &[(&str, &str)] = &[
    ("phoneNumber", "phoneNum"),
    ("zip", "zipCode"),
    ("picCredits", "photoCredit"),
];

const FIELDS: &[&str] = &[
    "legalName",
    "creditedName",
    "website",
    "address",
    "email",
    "phoneNum",
    "city",
    "state",
    "zipCode",
    "status",
    "isLaureate",
    "photoCredit",
    "poetImage",
    "poetBiography",
];

/// Normalize the poet block; rows without a legal name are skipped
pub fn normalize_poets(block: &TableBlock) -> Normalized<PoetRecord> {
    let view = BlockView::new(block, RENAMES, FIELDS);
    let mut out = Normalized::default();

    for row in view.rows() {
        let (legal_first_name, legal_last_name) = view
            .text(row, "legalName")
            .map(|raw| split_name(&raw))
            .unwrap_or_default();

        if legal_first_name.is_empty() && legal_last_name.is_empty() {
            out.skip(row, "poet has no legal name");
            continue;
        }

        // An empty half is "not provided" so it cannot blank a stored name
        let (credited_first_name, credited_last_name) = match view.text(row, "creditedName") {
            Some(raw) => {
                let (first, last) = split_name(&raw);
                (non_empty(first), non_empty(last))
            }
            None => (None, None),
        };

        let record = PoetRecord {
            legal_first_name,
            legal_last_name,
            credited_first_name,
            credited_last_name,
            website: view.text(row, "website"),
            address: view.text(row, "address"),
            email: view.text(row, "email"),
            phone_num: view.text(row, "phoneNum"),
            city: view.text(row, "city"),
            state: view.text(row, "state"),
            zip_code: view.text(row, "zipCode"),
            status: view.flag(row, "status", &["active"]),
            is_laureate: view.flag(row, "isLaureate", &["yes"]),
            photo_credit: view.text(row, "photoCredit"),
            poet_image: view.text(row, "poetImage"),
            poet_biography: view.text(row, "poetBiography"),
        };
        out.push(row, record);
    }

    out
}

fn non_empty(part: String) -> Option<String> {
    if part.is_empty() { None } else { Some(part) }
}
