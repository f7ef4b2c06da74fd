//! Database schema and operations

use std::str::FromStr;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{Activity, SpeedupCategory};
use crate::records::{EntryFields, EntryRecord, PackRecord, PlannerRecord, RECORD_VERSION};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Available speed-up minutes per category
        CREATE TABLE IF NOT EXISTS speedup_inventory (
            category TEXT PRIMARY KEY,
            minutes REAL NOT NULL
        );

        -- Hall of Chiefs entries; columns unused by an activity stay NULL
        CREATE TABLE IF NOT EXISTS ledger_entries (
            id INTEGER PRIMARY KEY,
            position INTEGER NOT NULL,
            activity TEXT NOT NULL,
            description TEXT,
            power REAL,
            points_per_power REAL,
            days INTEGER,
            hours INTEGER,
            minutes INTEGER,
            seconds INTEGER,
            troops_per_batch INTEGER,
            points_per_troop REAL,
            reduction_bonus_percent REAL,
            speedup_minutes_spent REAL
        );

        -- Purchased packs
        CREATE TABLE IF NOT EXISTS packs (
            id INTEGER PRIMARY KEY,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            price REAL NOT NULL,
            count_60min INTEGER NOT NULL,
            count_5min INTEGER NOT NULL,
            purchased_on TEXT
        );

        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Replace all stored state with `record` in one transaction
pub fn save_state(conn: &mut Connection, record: &PlannerRecord) -> Result<()> {
    let tx = conn.transaction()?;
    clear_tables(&tx)?;

    for (category, minutes) in &record.inventory {
        tx.execute(
            "INSERT INTO speedup_inventory (category, minutes) VALUES (?1, ?2)",
            params![category.as_ref(), minutes],
        )?;
    }

    // Ids need not ascend in insertion order, so the position is stored too
    for (position, entry) in record.entries.iter().enumerate() {
        let f = &entry.fields;
        tx.execute(
            "INSERT INTO ledger_entries (id, position, activity, description, power, points_per_power, days,
                 hours, minutes, seconds, troops_per_batch, points_per_troop, reduction_bonus_percent,
                 speedup_minutes_spent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                entry.id as i64,
                position as i64,
                entry.activity.as_ref(),
                f.description,
                f.power,
                f.points_per_power,
                f.days,
                f.hours,
                f.minutes,
                f.seconds,
                f.troops_per_batch,
                f.points_per_troop,
                f.reduction_bonus_percent,
                f.speedup_minutes_spent,
            ],
        )?;
    }

    for (position, pack) in record.packs.iter().enumerate() {
        tx.execute(
            "INSERT INTO packs (id, position, name, price, count_60min, count_5min, purchased_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                pack.id as i64,
                position as i64,
                pack.name,
                pack.price,
                pack.count_60min,
                pack.count_5min,
                pack.purchased_on,
            ],
        )?;
    }

    for (key, value) in [
        ("version", record.version.to_string()),
        ("next_entry_id", record.next_entry_id.to_string()),
        ("next_pack_id", record.next_pack_id.to_string()),
    ] {
        tx.execute("INSERT INTO metadata (key, value) VALUES (?1, ?2)", params![key, value])?;
    }

    tx.commit()?;
    tracing::debug!(
        entries = record.entries.len(),
        packs = record.packs.len(),
        "state saved"
    );
    Ok(())
}

/// Load the stored state; an empty database yields an empty record
pub fn load_state(conn: &Connection) -> Result<PlannerRecord> {
    let defaults = PlannerRecord::default();
    Ok(PlannerRecord {
        version: load_metadata(conn, "version")?.unwrap_or(RECORD_VERSION),
        inventory: load_inventory(conn)?,
        entries: load_entries(conn)?,
        packs: load_packs(conn)?,
        next_entry_id: load_metadata(conn, "next_entry_id")?.unwrap_or(defaults.next_entry_id),
        next_pack_id: load_metadata(conn, "next_pack_id")?.unwrap_or(defaults.next_pack_id),
    })
}

fn load_metadata<T>(conn: &Connection, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
        row.get::<_, String>(0)
    })
    .optional()?
    .map(|value| value.parse::<T>())
    .transpose()
    .with_context(|| format!("Stored {} is not a number", key))
}

fn load_inventory(conn: &Connection) -> Result<std::collections::BTreeMap<SpeedupCategory, f64>> {
    let mut stmt = conn.prepare("SELECT category, minutes FROM speedup_inventory")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?;

    let mut results = std::collections::BTreeMap::new();
    for row in rows {
        let (name, minutes) = row?;
        let category: SpeedupCategory = name
            .parse()
            .with_context(|| format!("Unknown speed-up category '{}' in database", name))?;
        results.insert(category, minutes);
    }
    Ok(results)
}

fn load_entries(conn: &Connection) -> Result<Vec<EntryRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, activity, description, power, points_per_power, days, hours, minutes, seconds,
                troops_per_batch, points_per_troop, reduction_bonus_percent, speedup_minutes_spent
         FROM ledger_entries ORDER BY position",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            EntryFields {
                description: row.get(2)?,
                power: row.get(3)?,
                points_per_power: row.get(4)?,
                days: row.get(5)?,
                hours: row.get(6)?,
                minutes: row.get(7)?,
                seconds: row.get(8)?,
                troops_per_batch: row.get(9)?,
                points_per_troop: row.get(10)?,
                reduction_bonus_percent: row.get(11)?,
                speedup_minutes_spent: row.get(12)?,
            },
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (id, activity, fields) = row?;
        let activity: Activity = activity
            .parse()
            .with_context(|| format!("Unknown activity '{}' for entry {}", activity, id))?;
        let id = u64::try_from(id).with_context(|| format!("Negative entry id {}", id))?;
        results.push(EntryRecord { id, activity, fields });
    }
    Ok(results)
}

fn load_packs(conn: &Connection) -> Result<Vec<PackRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, price, count_60min, count_5min, purchased_on FROM packs ORDER BY position",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, u32>(3)?,
            row.get::<_, u32>(4)?,
            row.get::<_, Option<String>>(5)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (id, name, price, count_60min, count_5min, purchased_on) = row?;
        let id = u64::try_from(id).with_context(|| format!("Negative pack id {}", id))?;
        results.push(PackRecord {
            id,
            name,
            price,
            count_60min,
            count_5min,
            purchased_on,
        });
    }
    Ok(results)
}

/// Delete all stored state
pub fn clear_state(conn: &Connection) -> Result<()> {
    clear_tables(conn)
}

fn clear_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM metadata;
        DELETE FROM packs;
        DELETE FROM ledger_entries;
        DELETE FROM speedup_inventory;
        "#,
    )?;
    Ok(())
}
