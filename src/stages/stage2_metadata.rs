use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::Proceeding;

/// Configuration for Stage 2 metadata merge
#[derive(Debug, Clone, Default)]
pub struct Stage2Config {
    /// Member table: `id name nationality birth_date birth_place`
    pub meps: PathBuf,
    /// National party memberships: `id n_party s_date e_date`
    pub national_parties: Option<PathBuf>,
    /// Political group memberships: `id p_group s_date e_date m_state`
    pub political_groups: Option<PathBuf>,
}

/// One row of the member table
#[derive(Debug, Clone, Deserialize)]
pub struct MepRecord {
    pub id: String,
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
}

/// One row of the national party table
#[derive(Debug, Clone, Deserialize)]
pub struct PartyRecord {
    pub id: String,
    pub n_party: Option<String>,
    pub s_date: Option<String>,
    pub e_date: Option<String>,
}

/// One row of the political group table
#[derive(Debug, Clone, Deserialize)]
pub struct GroupRecord {
    pub id: String,
    pub p_group: Option<String>,
    pub s_date: Option<String>,
    pub e_date: Option<String>,
    pub m_state: Option<String>,
}

/// Lookup tables, loaded once and shared by every proceeding
#[derive(Debug, Clone, Default)]
pub struct MetadataTables {
    meps: HashMap<String, MepRecord>,
    parties: HashMap<String, Vec<PartyRecord>>,
    groups: HashMap<String, Vec<GroupRecord>>,
}

impl MetadataTables {
    /// Load the tables named in the configuration
    pub fn load(config: &Stage2Config) -> Result<Self> {
        let meps = read_table_file(&config.meps)?;
        let parties = match &config.national_parties {
            Some(path) => read_table_file(path)?,
            None => Vec::new(),
        };
        let groups = match &config.political_groups {
            Some(path) => read_table_file(path)?,
            None => Vec::new(),
        };
        let tables = Self::from_records(meps, parties, groups);
        info!(
            "Loaded {} members, {} party memberships, {} group memberships",
            tables.meps.len(),
            tables.parties.values().map(Vec::len).sum::<usize>(),
            tables.groups.values().map(Vec::len).sum::<usize>()
        );
        Ok(tables)
    }

    pub fn from_records(
        meps: Vec<MepRecord>,
        parties: Vec<PartyRecord>,
        groups: Vec<GroupRecord>,
    ) -> Self {
        let mut tables = Self::default();
        for mep in meps {
            tables.meps.entry(mep.id.trim().to_string()).or_insert(mep);
        }
        for party in parties {
            tables
                .parties
                .entry(party.id.trim().to_string())
                .or_default()
                .push(party);
        }
        for group in groups {
            tables
                .groups
                .entry(group.id.trim().to_string())
                .or_default()
                .push(group);
        }
        tables
    }

    pub fn member(&self, id: &str) -> Option<&MepRecord> {
        self.meps.get(id)
    }

    /// First national party membership covering the date
    pub fn party_on(&self, id: &str, date: NaiveDate) -> Option<&PartyRecord> {
        self.parties
            .get(id)?
            .iter()
            .find(|r| covers(r.s_date.as_deref(), r.e_date.as_deref(), date))
    }

    /// First political group membership covering the date
    pub fn group_on(&self, id: &str, date: NaiveDate) -> Option<&GroupRecord> {
        self.groups
            .get(id)?
            .iter()
            .find(|r| covers(r.s_date.as_deref(), r.e_date.as_deref(), date))
    }
}

/// Read a tab-separated table with a header row
pub fn read_table<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

fn read_table_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path)?;
    read_table(file)
}

/// Whether `[start, end]` contains the date. A missing bound is open.
/// An unparsable bound never matches.
fn covers(start: Option<&str>, end: Option<&str>, date: NaiveDate) -> bool {
    let within_start = match start.filter(|s| !s.is_empty()) {
        Some(s) => parse_table_date(s).is_some_and(|s| s <= date),
        None => true,
    };
    let within_end = match end.filter(|e| !e.is_empty()) {
        Some(e) => parse_table_date(e).is_some_and(|e| date <= e),
        None => true,
    };
    within_start && within_end
}

/// Table dates: ISO, `dd/mm/yyyy` or `dd.mm.yyyy`; a time part is ignored
pub fn parse_table_date(text: &str) -> Option<NaiveDate> {
    let day = text.split_whitespace().next()?;
    ["%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(day, format).ok())
}

/// Result of Stage 2 metadata merge
#[derive(Debug, Default)]
pub struct Stage2Result {
    /// Interventions that received member metadata
    pub interventions_enriched: usize,
    /// Speaker identifiers missing from the member table
    pub unknown_speakers: Vec<String>,
}

/// Execute Stage 2: attach member biographies to interventions
///
/// Only interventions whose speaker identifier is in the member table are
/// touched. Party and group come from the first membership row whose date
/// range contains the sitting date. Empty cells are never attached. Empty
/// interventions and sections read from the input are pruned.
pub fn execute_stage2(proceeding: &mut Proceeding, tables: &MetadataTables) -> Stage2Result {
    let date = proceeding.date;
    let mut result = Stage2Result::default();

    for intervention in proceeding.interventions_mut() {
        let Some(speaker_id) = intervention.speaker_id.clone() else {
            continue;
        };
        let Some(mep) = tables.member(&speaker_id) else {
            debug!("{}: speaker {} not in member table", intervention.id, speaker_id);
            if !result.unknown_speakers.contains(&speaker_id) {
                result.unknown_speakers.push(speaker_id);
            }
            continue;
        };

        if let Some(name) = non_empty(&mep.name) {
            intervention.name = Some(name);
        }
        let bio = &mut intervention.biography;
        let mut attach = |key: &str, value: &Option<String>| {
            if let Some(value) = non_empty(value) {
                bio.set(key, value);
            }
        };
        attach("nationality", &mep.nationality);
        attach("birth_date", &mep.birth_date);
        attach("birth_place", &mep.birth_place);
        if let Some(party) = tables.party_on(&speaker_id, date) {
            attach("n_party", &party.n_party);
        }
        if let Some(group) = tables.group_on(&speaker_id, date) {
            attach("p_group", &group.p_group);
            attach("m_state", &group.m_state);
        }
        result.interventions_enriched += 1;
    }

    proceeding.prune();
    result
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
