use anyhow::Result;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use sqlite::{Connection, State, Statement};

use super::{
    bind_all, execute_with, like_escape, non_empty, Database, Param, Resident, ResidentNote,
};
use crate::core::time::{from_db, to_db};

const RESIDENT_COLUMNS: &str =
    "id, full_name, room_number, gender, medical_conditions, medications";

/// Notes shown with a resident profile
const PROFILE_NOTE_LIMIT: i64 = 3;

fn read_resident(statement: &Statement<'_>) -> Result<Resident> {
    let conditions: String = statement.read("medical_conditions")?;
    let medications: String = statement.read("medications")?;
    Ok(Resident {
        id: statement.read("id")?,
        full_name: statement.read("full_name")?,
        room_number: non_empty(statement.read("room_number")?),
        gender: non_empty(statement.read("gender")?),
        medical_conditions: serde_json::from_str(&conditions).unwrap_or_default(),
        medications: serde_json::from_str(&medications).unwrap_or_default(),
        notes: Vec::new(),
    })
}

fn query_residents(connection: &Connection, sql: &str, params: &[Param]) -> Result<Vec<Resident>> {
    let mut statement = connection.prepare(sql)?;
    bind_all(&mut statement, params)?;
    let mut residents = Vec::new();
    while let State::Row = statement.next()? {
        residents.push(read_resident(&statement)?);
    }
    Ok(residents)
}

fn query_notes(connection: &Connection, resident_id: &str, limit: i64) -> Result<Vec<ResidentNote>> {
    let mut statement = connection.prepare(
        "SELECT text, created_by, created_at FROM resident_notes
         WHERE resident_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
    )?;
    bind_all(&mut statement, &[resident_id.into(), Param::Int(limit)])?;

    let mut notes = Vec::new();
    while let State::Row = statement.next()? {
        let created_at: String = statement.read("created_at")?;
        let Some(created_at) = from_db(&created_at) else {
            warn!("Skipping note with unreadable timestamp '{created_at}'");
            continue;
        };
        notes.push(ResidentNote {
            text: statement.read("text")?,
            created_by: non_empty(statement.read("created_by")?),
            created_at,
        });
    }
    Ok(notes)
}

/// Words longer than two characters, used for partial name matching
fn name_parts(name: &str) -> Vec<String> {
    name.split_whitespace()
        .filter(|part| part.chars().count() > 2)
        .map(|part| part.to_lowercase())
        .collect()
}

impl Database {
    pub async fn add_resident(&self, resident: &Resident) -> Result<()> {
        let conn = self.connection.lock().await;
        execute_with(
            &conn,
            "INSERT OR REPLACE INTO residents
             (id, full_name, room_number, gender, medical_conditions, medications)
             VALUES (?, ?, ?, ?, ?, ?)",
            &[
                resident.id.as_str().into(),
                resident.full_name.as_str().into(),
                resident.room_number.clone().unwrap_or_default().into(),
                resident.gender.clone().unwrap_or_default().into(),
                serde_json::to_string(&resident.medical_conditions)?.into(),
                serde_json::to_string(&resident.medications)?.into(),
            ],
        )
    }

    pub async fn get_all_residents(&self, limit: i64) -> Result<Vec<Resident>> {
        let conn = self.connection.lock().await;
        let residents = query_residents(
            &conn,
            &format!("SELECT {RESIDENT_COLUMNS} FROM residents ORDER BY full_name LIMIT ?"),
            &[Param::Int(limit)],
        )?;
        info!("Retrieved {} residents", residents.len());
        Ok(residents)
    }

    /// Look up a resident by name: exact match, then substring, then any word of the name.
    ///
    /// All comparisons ignore case. The returned resident carries its latest notes.
    pub async fn get_resident_by_name(&self, name: &str) -> Result<Option<Resident>> {
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Ok(None);
        }
        debug!("Searching for resident with name: '{name}'");

        let conn = self.connection.lock().await;
        let lowered = name.to_lowercase();

        let exact = query_residents(
            &conn,
            &format!(
                "SELECT {RESIDENT_COLUMNS} FROM residents
                 WHERE LOWER(full_name) = ? ORDER BY full_name LIMIT 1"
            ),
            &[lowered.as_str().into()],
        )?;

        let found = if let Some(resident) = exact.into_iter().next() {
            info!("Found resident by exact match: {}", resident.full_name);
            Some(resident)
        } else {
            let partial = query_residents(
                &conn,
                &format!(
                    "SELECT {RESIDENT_COLUMNS} FROM residents
                     WHERE LOWER(full_name) LIKE ? ESCAPE '\\' ORDER BY full_name LIMIT 1"
                ),
                &[format!("%{}%", like_escape(&lowered)).into()],
            )?;

            if let Some(resident) = partial.into_iter().next() {
                info!("Found resident by partial name match: {}", resident.full_name);
                Some(resident)
            } else {
                let parts = name_parts(&name);
                if parts.is_empty() {
                    None
                } else {
                    let clauses = vec!["(' ' || LOWER(full_name) || ' ') LIKE ? ESCAPE '\\'"; parts.len()];
                    let params: Vec<Param> = parts
                        .iter()
                        .map(|part| Param::Text(format!("% {} %", like_escape(part))))
                        .collect();
                    let by_part = query_residents(
                        &conn,
                        &format!(
                            "SELECT {RESIDENT_COLUMNS} FROM residents WHERE {}
                             ORDER BY full_name LIMIT 1",
                            clauses.join(" OR ")
                        ),
                        &params,
                    )?;
                    let resident = by_part.into_iter().next();
                    if let Some(resident) = &resident {
                        info!("Found resident by name part match: {}", resident.full_name);
                    }
                    resident
                }
            }
        };

        match found {
            Some(mut resident) => {
                resident.notes = query_notes(&conn, &resident.id, PROFILE_NOTE_LIMIT)?;
                Ok(Some(resident))
            }
            None => {
                info!("No resident found matching name: '{name}'");
                Ok(None)
            }
        }
    }

    /// Names that share a three-letter stem with any word of `query`
    pub async fn similar_resident_names(&self, query: &str, limit: i64) -> Result<Vec<String>> {
        let stems: Vec<String> = name_parts(query)
            .into_iter()
            .map(|part| part.chars().take(3).collect::<String>())
            .collect();
        if stems.is_empty() {
            return Ok(Vec::new());
        }

        let clauses = vec!["LOWER(full_name) LIKE ? ESCAPE '\\'"; stems.len()];
        let mut params: Vec<Param> = stems
            .iter()
            .map(|stem| Param::Text(format!("%{}%", like_escape(stem))))
            .collect();
        params.push(Param::Int(limit));

        let conn = self.connection.lock().await;
        let residents = query_residents(
            &conn,
            &format!(
                "SELECT {RESIDENT_COLUMNS} FROM residents WHERE {} ORDER BY full_name LIMIT ?",
                clauses.join(" OR ")
            ),
            &params,
        )?;
        Ok(residents.into_iter().map(|r| r.full_name).collect())
    }

    /// Append a note to a resident. Returns false when the resident does not exist
    /// or the note is empty.
    pub async fn add_resident_note(
        &self,
        resident_id: &str,
        note: &str,
        created_by: Option<&str>,
        at: NaiveDateTime,
    ) -> Result<bool> {
        if resident_id.is_empty() || note.trim().is_empty() {
            return Ok(false);
        }

        let conn = self.connection.lock().await;
        let exists = !query_residents(
            &conn,
            &format!("SELECT {RESIDENT_COLUMNS} FROM residents WHERE id = ?"),
            &[resident_id.into()],
        )?
        .is_empty();

        if !exists {
            warn!("Failed to add note: resident {resident_id} not found");
            return Ok(false);
        }

        execute_with(
            &conn,
            "INSERT INTO resident_notes (resident_id, text, created_by, created_at)
             VALUES (?, ?, ?, ?)",
            &[
                resident_id.into(),
                note.trim().into(),
                created_by.unwrap_or_default().into(),
                to_db(&at).into(),
            ],
        )?;
        info!("Added note to resident {resident_id}");
        Ok(true)
    }
}
