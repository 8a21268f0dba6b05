//! Typed entity records produced by normalization
//!
//! `None` always means "not provided by the sheet": inserts fall back to the
//! column default, updates keep the stored value.

use chrono::NaiveDate;

/// Poet row, keyed by legal name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoetRecord {
    pub legal_first_name: String,
    pub legal_last_name: String,
    pub credited_first_name: Option<String>,
    pub credited_last_name: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone_num: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub status: Option<bool>,
    pub is_laureate: Option<bool>,
    pub photo_credit: Option<String>,
    pub poet_image: Option<String>,
    pub poet_biography: Option<String>,
}

/// Poem row before lookup resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoemRecord {
    pub title: Option<String>,
    pub telepoem_number: Option<String>,
    pub era: Option<String>,
    pub types: Vec<String>,
    pub topics: Vec<String>,
    pub special_tags: Vec<String>,
    pub languages: Vec<String>,
    pub image: Option<String>,
    pub producer_name: Option<String>,
    pub narrator_name: Option<String>,
    pub recording_date: Option<NaiveDate>,
    pub recording_source: Option<String>,
    pub recording_duration: Option<String>,
    pub optional_legal: Option<String>,
    pub copy_rights: Option<String>,
    pub poem_text: Option<String>,
    pub active: Option<bool>,
    pub is_childrens_poem: Option<bool>,
    pub is_adult_poem: Option<bool>,
}

/// Per-booth columns shared by every booth expanded from one row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoothDetails {
    pub directory_tablet_serial_number: Option<String>,
    pub physical_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub installation_date: Option<String>,
    pub installation_type: Option<String>,
    pub active: Option<bool>,
    pub is_ada_accessible: Option<bool>,
    pub phone_serial_number: Option<String>,
    pub highlighted_criteria: Option<String>,
    pub installation_notes: Option<String>,
    pub device_info: Option<String>,
    pub booth_image: Option<String>,
}

/// Booth row as written in the sheet, possibly describing several booths
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoothRecord {
    pub names: Vec<String>,
    pub numbers: Vec<String>,
    pub phone_types: Vec<String>,
    pub booth_types: Vec<String>,
    pub directory_type: Option<String>,
    pub maintainer_name: Option<String>,
    pub details: BoothDetails,
}

/// One booth after expansion
#[derive(Debug, Clone, PartialEq)]
pub struct BoothSlot<'a> {
    pub name: &'a str,
    pub number: Option<&'a str>,
    pub phone_type: Option<&'a str>,
    pub booth_type: Option<&'a str>,
}

impl BoothRecord {
    /// Expand packed lists into one slot per booth name.
    ///
    /// Booth `i` takes element `i` of every list, or the last element of a
    /// shorter list. Empty lists yield `None`.
    pub fn expand(&self) -> Vec<BoothSlot<'_>> {
        fn pick(list: &[String], i: usize) -> Option<&str> {
            list.get(i).or_else(|| list.last()).map(String::as_str)
        }

        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| BoothSlot {
                name,
                number: pick(&self.numbers, i),
                phone_type: pick(&self.phone_types, i),
                booth_type: pick(&self.booth_types, i),
            })
            .collect()
    }
}

/// Collection row; one cell may name several collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionRecord {
    pub names: Vec<String>,
    pub description: Option<String>,
}
