use super::text::SEMICOLON_LIST;
use super::{BlockView, Normalized};
use crate::import::records::{BoothDetails, BoothRecord};
use crate::sheet::TableBlock;

const RENAMES: &[(&str, &str)] = &[
    ("boothNumber", "number"),
    ("boothMaintainerName", "maintainerName"),
    ("address", "physicalAddress"),
    ("isAdaAccessible", "isADAAccessible"),
];

const FIELDS: &[&str] = &[
    "boothName",
    "number",
    "phoneType",
    "boothType",
    "directoryType",
    "maintainerName",
    "directoryTabletSerialNumber",
    "physicalAddress",
    "city",
    "state",
    "zipCode",
    "installationDate",
    "installationType",
    "active",
    "isADAAccessible",
    "phoneSerialNumber",
    "highlightedCriteria",
    "installationNotes",
    "deviceInfo",
    "boothImage",
];

/// Normalize the booth block; rows without a booth name are skipped
pub fn normalize_booths(block: &TableBlock) -> Normalized<BoothRecord> {
    let view = BlockView::new(block, RENAMES, FIELDS);
    let mut out = Normalized::default();

    for row in view.rows() {
        let names = view.list(row, "boothName", SEMICOLON_LIST);
        if names.is_empty() {
            out.skip(row, "booth has no name");
            continue;
        }

        let details = BoothDetails {
            directory_tablet_serial_number: view.text(row, "directoryTabletSerialNumber"),
            physical_address: view.text(row, "physicalAddress"),
            city: view.text(row, "city"),
            state: view.text(row, "state"),
            zip_code: view.text(row, "zipCode"),
            installation_date: view.text(row, "installationDate"),
            installation_type: view.text(row, "installationType"),
            active: view.flag(row, "active", &["yes", "active"]),
            is_ada_accessible: view.flag(row, "isADAAccessible", &["yes"]),
            phone_serial_number: view.text(row, "phoneSerialNumber"),
            highlighted_criteria: view.text(row, "highlightedCriteria"),
            installation_notes: view.text(row, "installationNotes"),
            device_info: view.text(row, "deviceInfo"),
            booth_image: view.text(row, "boothImage"),
        };

        let record = BoothRecord {
            names,
            numbers: view.list(row, "number", SEMICOLON_LIST),
            phone_types: view.list(row, "phoneType", SEMICOLON_LIST),
            booth_types: view.list(row, "boothType", SEMICOLON_LIST),
            directory_type: view.text(row, "directoryType"),
            maintainer_name: view.text(row, "maintainerName"),
            details,
        };
        out.push(row, record);
    }

    out
}
