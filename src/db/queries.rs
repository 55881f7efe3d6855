use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::gateway::wire::{
    BookingInsert, BookingRow, BookingUpdate, RegistrationInsert, RegistrationRow, UserRow,
    WireValue,
};

impl ToSql for WireValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            WireValue::Int(n) => ToSqlOutput::from(*n),
            WireValue::Float(f) => ToSqlOutput::from(*f),
            WireValue::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl FromSql for WireValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(n) => Ok(WireValue::Int(n)),
            ValueRef::Real(f) => Ok(WireValue::Float(f)),
            ValueRef::Text(_) => value.as_str().map(|s| WireValue::Text(s.to_string())),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    // Fixed width so that text ordering is chronological.
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn get_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, service_id, service_name, category, date, time, address, \
     customer_name, customer_phone, price, status, provider_id, created_at";

pub fn insert_booking(conn: &Connection, booking: &BookingInsert) -> anyhow::Result<BookingRow> {
    conn.execute(
        "INSERT INTO bookings (service_id, service_name, category, date, time, address, customer_name, customer_phone, price, status, provider_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            booking.service_id,
            booking.service_name,
            booking.category,
            booking.date,
            booking.time,
            booking.address,
            booking.customer_name,
            booking.customer_phone,
            booking.price,
            booking.status,
            booking.provider_id,
            format_timestamp(&booking.created_at),
        ],
    )?;

    let id = conn.last_insert_rowid();
    get_booking(conn, id)?.ok_or_else(|| anyhow::anyhow!("inserted booking {id} not found"))
}

pub fn get_booking(conn: &Connection, id: i64) -> anyhow::Result<Option<BookingRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            parse_booking_row,
        )
        .optional()?;
    Ok(row)
}

pub fn list_bookings(conn: &Connection) -> anyhow::Result<Vec<BookingRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC, id DESC"
    ))?;

    let rows = stmt.query_map([], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn update_booking(conn: &Connection, id: i64, update: &BookingUpdate) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET
           status = COALESCE(?1, status),
           provider_id = COALESCE(?2, provider_id)
         WHERE id = ?3",
        params![update.status, update.provider_id, id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &Row<'_>) -> rusqlite::Result<BookingRow> {
    Ok(BookingRow {
        id: row.get(0)?,
        service_id: row.get(1)?,
        service_name: row.get(2)?,
        category: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        address: row.get(6)?,
        customer_name: row.get(7)?,
        customer_phone: row.get(8)?,
        price: row.get::<_, i64>(9)? as f64,
        status: row.get(10)?,
        provider_id: row.get(11)?,
        created_at: get_timestamp(row, 12)?,
    })
}

// ── Registrations ──

pub fn insert_registration(
    conn: &Connection,
    reg: &RegistrationInsert,
) -> anyhow::Result<RegistrationRow> {
    conn.execute(
        "INSERT INTO registrations (full_name, phone, category, experience, city, submitted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            reg.full_name,
            reg.phone,
            reg.category,
            reg.experience,
            reg.city,
            format_timestamp(&reg.submitted_at),
        ],
    )?;

    Ok(RegistrationRow {
        id: WireValue::Int(conn.last_insert_rowid()),
        full_name: reg.full_name.clone(),
        phone: reg.phone.clone(),
        category: reg.category.clone(),
        experience: WireValue::Text(reg.experience.clone()),
        city: reg.city.clone(),
        submitted_at: reg.submitted_at,
    })
}

pub fn list_registrations(conn: &Connection) -> anyhow::Result<Vec<RegistrationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, full_name, phone, category, experience, city, submitted_at
         FROM registrations ORDER BY submitted_at DESC, id DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(RegistrationRow {
            id: row.get(0)?,
            full_name: row.get(1)?,
            phone: row.get(2)?,
            category: row.get(3)?,
            experience: row.get(4)?,
            city: row.get(5)?,
            submitted_at: get_timestamp(row, 6)?,
        })
    })?;

    let mut regs = vec![];
    for row in rows {
        regs.push(row?);
    }
    Ok(regs)
}

// ── Users ──

pub fn insert_user(conn: &Connection, user: &UserRow) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (username, name, role, category) VALUES (?1, ?2, ?3, ?4)",
        params![user.username, user.name, user.role, user.category],
    )?;
    Ok(())
}

pub fn list_users(conn: &Connection) -> anyhow::Result<Vec<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT username, name, role, category FROM users ORDER BY username ASC")?;

    let rows = stmt.query_map([], |row| {
        Ok(UserRow {
            username: row.get(0)?,
            name: row.get(1)?,
            role: row.get(2)?,
            category: row.get(3)?,
        })
    })?;

    let mut users = vec![];
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

pub fn delete_user(conn: &Connection, username: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM users WHERE username = ?1", params![username])?;
    Ok(count > 0)
}
