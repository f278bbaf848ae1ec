// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! SQLite backed collection.
//!
//! # Tables
//!
//! * `artists`, `genres` - Unique names.
//! * `albums` - Album rows with popularity, love flag and insertion time.
//! * `album_artists` - Album to artist links.
//! * `tracks` - Playable files with position, stats and timestamps.
//! * `track_artists`, `track_genres` - Track to artist and genre links.
//!
//! # Performance
//!
//! Most functions in this module use [`rusqlite::Connection::prepare_cached`]
//! to reduce SQL parsing overhead.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};

use crate::{
    library::Library,
    model::{Album, Selection, Track},
};

/// Size of the smart selections (popular, random, recent albums).
const SMART_LIMIT: i64 = 100;

/// Columns mapped by `Track::from_row`, in order.
pub(super) const TRACK_COLUMNS: &str = "
    tr.id, tr.title, tr.uri, tr.duration_ms, tr.album_id, al.title,
    tr.track_number, tr.disc_number, tr.year, tr.loved, tr.rate, tr.popularity,
    (SELECT GROUP_CONCAT(ta.artist_id) FROM track_artists ta WHERE ta.track_id = tr.id),
    (SELECT GROUP_CONCAT(ar.name, char(31)) FROM track_artists ta
        JOIN artists ar ON ar.id = ta.artist_id WHERE ta.track_id = tr.id),
    (SELECT GROUP_CONCAT(tg.genre_id) FROM track_genres tg WHERE tg.track_id = tr.id)";

const ALBUM_COLUMNS: &str = "
    al.id, al.title, al.year,
    (SELECT GROUP_CONCAT(aa.artist_id) FROM album_artists aa WHERE aa.album_id = al.id),
    (SELECT GROUP_CONCAT(ar.name, char(31)) FROM album_artists aa
        JOIN artists ar ON ar.id = aa.artist_id WHERE aa.album_id = al.id)";

/// Display order of album lists: first artist name, then year and title.
const ALBUM_ORDER: &str = "
    ORDER BY (SELECT MIN(ar.name) FROM album_artists aa
        JOIN artists ar ON ar.id = aa.artist_id WHERE aa.album_id = al.id),
    al.year, al.title";

/// A track row to insert with [`SqliteLibrary::add_track`].
#[derive(Debug, Clone, Default)]
pub struct NewTrack {
    pub album_id: i64,
    pub title: String,
    pub uri: String,
    pub duration_ms: i64,
    pub number: u32,
    pub disc_number: u32,
    pub year: Option<i64>,
    pub artist_ids: Vec<i64>,
    pub genre_ids: Vec<i64>,
}

pub struct SqliteLibrary {
    conn: Connection,
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Builds the album id query for a selection.
///
/// Returns the SQL text and its positional parameters.
fn album_selection_sql(selection: &Selection) -> (String, Vec<i64>) {
    let base = "SELECT al.id FROM albums al";
    let mut params = Vec::new();

    let sql = match selection {
        Selection::All { artist_ids } if artist_ids.is_empty() => {
            format!("{base} {ALBUM_ORDER}")
        }
        Selection::All { artist_ids } => {
            params.extend(artist_ids);
            format!(
                "{base} WHERE EXISTS (SELECT 1 FROM album_artists aa
                    WHERE aa.album_id = al.id AND aa.artist_id IN ({}))
                 {ALBUM_ORDER}",
                placeholders(artist_ids.len())
            )
        }
        Selection::Compilations => {
            format!("{base} WHERE al.compilation = 1 ORDER BY al.title")
        }
        Selection::Populars => {
            params.push(SMART_LIMIT);
            format!("{base} WHERE al.popularity > 0 ORDER BY al.popularity DESC LIMIT ?")
        }
        Selection::Randoms => {
            params.push(SMART_LIMIT);
            format!("{base} ORDER BY RANDOM() LIMIT ?")
        }
        Selection::Recents => {
            params.push(SMART_LIMIT);
            format!("{base} ORDER BY al.mtime DESC LIMIT ?")
        }
        Selection::Loved => format!("{base} WHERE al.loved = 1 {ALBUM_ORDER}"),
        Selection::Years(years) => {
            params.extend(years);
            format!(
                "{base} WHERE al.year IN ({}) ORDER BY al.year, al.title",
                placeholders(years.len())
            )
        }
        Selection::Genres {
            genre_ids,
            artist_ids,
        } => {
            params.extend(genre_ids);
            let mut sql = format!(
                "{base} WHERE EXISTS (SELECT 1 FROM tracks tr
                    JOIN track_genres tg ON tg.track_id = tr.id
                    WHERE tr.album_id = al.id AND tg.genre_id IN ({}))",
                placeholders(genre_ids.len())
            );
            if !artist_ids.is_empty() {
                params.extend(artist_ids);
                sql.push_str(&format!(
                    " AND EXISTS (SELECT 1 FROM album_artists aa
                        WHERE aa.album_id = al.id AND aa.artist_id IN ({}))",
                    placeholders(artist_ids.len())
                ));
            }
            sql.push(' ');
            sql.push_str(ALBUM_ORDER);
            sql
        }
    };

    (sql, params)
}

impl SqliteLibrary {
    /// Opens the collection database and configures performance settings.
    ///
    /// This function performs the following setup:
    /// * **WAL Mode**: Enables Write-Ahead Logging for better concurrency.
    /// * **Performance Tuning**: Sets synchronous mode to `NORMAL` and increases the cache size.
    /// * **Constraints**: Enforces foreign key integrity.
    /// * **Schema**: Ensures all tables and indices exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, the PRAGMA
    /// configuration fails or the schema cannot be created.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;

        let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
        if journal_mode != "wal" {
            anyhow::bail!(
                "Failed to switch to WAL mode. Current mode: {}",
                journal_mode
            );
        }

        conn.execute_batch(
            "
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000; -- Use 64MB of RAM for cache
        ",
        )?;

        Self::with_connection(conn)
    }

    /// A private, non-persistent collection.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.set_prepared_statement_cache_capacity(100);

        let library = Self { conn };
        library.create_schema()?;

        Ok(library)
    }

    /// Creates the tables if they do not already exist, in a single
    /// transaction.
    fn create_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "BEGIN;

            CREATE TABLE IF NOT EXISTS artists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL COLLATE NOCASE UNIQUE
            );

            CREATE TABLE IF NOT EXISTS genres (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL COLLATE NOCASE UNIQUE
            );

            CREATE TABLE IF NOT EXISTS albums (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL COLLATE NOCASE,
                year INTEGER,
                compilation INTEGER NOT NULL DEFAULT 0,
                loved INTEGER NOT NULL DEFAULT 0,
                popularity INTEGER NOT NULL DEFAULT 0,
                mtime INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS album_artists (
                album_id INTEGER NOT NULL,
                artist_id INTEGER NOT NULL,
                PRIMARY KEY (album_id, artist_id),
                FOREIGN KEY (album_id) REFERENCES albums (id) ON DELETE CASCADE,
                FOREIGN KEY (artist_id) REFERENCES artists (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS tracks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                album_id INTEGER NOT NULL,
                title TEXT NOT NULL COLLATE NOCASE,
                uri TEXT NOT NULL UNIQUE,
                duration_ms INTEGER NOT NULL DEFAULT 0,
                track_number INTEGER,
                disc_number INTEGER,
                year INTEGER,
                loved INTEGER NOT NULL DEFAULT 0,
                rate INTEGER NOT NULL DEFAULT 0,
                popularity INTEGER NOT NULL DEFAULT 0,
                ltime INTEGER NOT NULL DEFAULT 0,
                mtime INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (album_id) REFERENCES albums (id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_tracks_album_id ON tracks (album_id);

            CREATE TABLE IF NOT EXISTS track_artists (
                track_id INTEGER NOT NULL,
                artist_id INTEGER NOT NULL,
                PRIMARY KEY (track_id, artist_id),
                FOREIGN KEY (track_id) REFERENCES tracks (id) ON DELETE CASCADE,
                FOREIGN KEY (artist_id) REFERENCES artists (id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS track_genres (
                track_id INTEGER NOT NULL,
                genre_id INTEGER NOT NULL,
                PRIMARY KEY (track_id, genre_id),
                FOREIGN KEY (track_id) REFERENCES tracks (id) ON DELETE CASCADE,
                FOREIGN KEY (genre_id) REFERENCES genres (id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_track_genres_genre_id ON track_genres (genre_id);

            COMMIT;",
            )
            .context("Failed to create schema")
    }

    pub fn add_artist(&self, name: &str) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO artists (name) VALUES (?1)
             ON CONFLICT (name) DO UPDATE SET name = excluded.name
             RETURNING id",
        )?;
        Ok(stmt.query_row([name], |r| r.get(0))?)
    }

    pub fn add_genre(&self, name: &str) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO genres (name) VALUES (?1)
             ON CONFLICT (name) DO UPDATE SET name = excluded.name
             RETURNING id",
        )?;
        Ok(stmt.query_row([name], |r| r.get(0))?)
    }

    pub fn add_album(
        &self,
        title: &str,
        artist_ids: &[i64],
        year: Option<i64>,
        compilation: bool,
    ) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO albums (title, year, compilation, mtime) VALUES (?1, ?2, ?3, ?4)",
            params![title, year, compilation, now()],
        )?;
        let album_id = tx.last_insert_rowid();
        for artist_id in artist_ids {
            tx.execute(
                "INSERT INTO album_artists (album_id, artist_id) VALUES (?1, ?2)",
                params![album_id, artist_id],
            )?;
        }
        tx.commit()?;

        Ok(album_id)
    }

    pub fn add_track(&self, track: &NewTrack) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tracks (album_id, title, uri, duration_ms, track_number, disc_number, year, mtime)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                track.album_id,
                track.title,
                track.uri,
                track.duration_ms,
                track.number,
                track.disc_number,
                track.year,
                now()
            ],
        )?;
        let track_id = tx.last_insert_rowid();
        for artist_id in &track.artist_ids {
            tx.execute(
                "INSERT INTO track_artists (track_id, artist_id) VALUES (?1, ?2)",
                params![track_id, artist_id],
            )?;
        }
        for genre_id in &track.genre_ids {
            tx.execute(
                "INSERT INTO track_genres (track_id, genre_id) VALUES (?1, ?2)",
                params![track_id, genre_id],
            )?;
        }
        tx.commit()?;

        Ok(track_id)
    }

    pub fn set_album_loved(&self, album_id: i64, loved: bool) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE albums SET loved = ?2 WHERE id = ?1")?;
        stmt.execute(params![album_id, loved])?;

        Ok(())
    }

    pub fn album_popularity(&self, album_id: i64) -> Result<i64> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT popularity FROM albums WHERE id = ?")?;
        Ok(stmt.query_row([album_id], |r| r.get(0))?)
    }

    pub fn listened_at(&self, track_id: i64) -> Result<i64> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT ltime FROM tracks WHERE id = ?")?;
        Ok(stmt.query_row([track_id], |r| r.get(0))?)
    }
}

impl Library for SqliteLibrary {
    fn track(&self, id: i64) -> Result<Option<Track>> {
        let sql = format!(
            "SELECT {TRACK_COLUMNS}
             FROM tracks tr
             JOIN albums al ON al.id = tr.album_id
             WHERE tr.id = ?"
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let track = stmt.query_row([id], Track::from_row).optional()?;

        Ok(track)
    }

    fn album(&self, id: i64) -> Result<Option<Album>> {
        let sql = format!("SELECT {ALBUM_COLUMNS} FROM albums al WHERE al.id = ?");

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let album = stmt.query_row([id], Album::from_row).optional()?;

        Ok(album)
    }

    fn album_track_ids(
        &self,
        album_id: i64,
        genre_ids: &[i64],
        artist_ids: &[i64],
    ) -> Result<Vec<i64>> {
        let mut sql = String::from("SELECT tr.id FROM tracks tr WHERE tr.album_id = ?");
        let mut params = vec![album_id];

        if !genre_ids.is_empty() {
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM track_genres tg
                    WHERE tg.track_id = tr.id AND tg.genre_id IN ({}))",
                placeholders(genre_ids.len())
            ));
            params.extend(genre_ids);
        }

        if !artist_ids.is_empty() {
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM track_artists ta
                    WHERE ta.track_id = tr.id AND ta.artist_id IN ({}))",
                placeholders(artist_ids.len())
            ));
            params.extend(artist_ids);
        }

        sql.push_str(" ORDER BY tr.disc_number, tr.track_number, tr.title");

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let results = stmt
            .query_map(params_from_iter(params), |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(results)
    }

    fn album_ids(&self, selection: &Selection) -> Result<Vec<i64>> {
        let (sql, params) = album_selection_sql(selection);
        debug!("Album selection {:?}", selection);

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let results = stmt
            .query_map(params_from_iter(params), |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(results)
    }

    fn album_ids_for_artist(&self, name: &str) -> Result<Vec<i64>> {
        let sql = "
            SELECT al.id FROM albums al
            JOIN album_artists aa ON aa.album_id = al.id
            JOIN artists ar ON ar.id = aa.artist_id
            WHERE ar.name = ?
            ORDER BY al.year, al.title";

        let mut stmt = self.conn.prepare_cached(sql)?;
        let results = stmt
            .query_map([name], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(results)
    }

    fn max_album_track_count(&self) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT COALESCE(MAX(count), 0)
             FROM (SELECT COUNT(*) AS count FROM tracks GROUP BY album_id)",
        )?;
        Ok(stmt.query_row([], |r| r.get(0))?)
    }

    fn increment_track_popularity(&self, track_id: i64) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE tracks SET popularity = popularity + 1 WHERE id = ?")?;
        stmt.execute([track_id])?;

        Ok(())
    }

    fn increment_album_popularity(&self, album_id: i64, by: i64) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE albums SET popularity = popularity + ?2 WHERE id = ?1")?;
        stmt.execute(params![album_id, by])?;

        Ok(())
    }

    fn set_listened_at(&self, track_id: i64, timestamp: i64) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE tracks SET ltime = ?2 WHERE id = ?1")?;
        stmt.execute(params![track_id, timestamp])?;

        Ok(())
    }

    fn set_loved(&self, track_id: i64, loved: bool) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE tracks SET loved = ?2 WHERE id = ?1")?;
        stmt.execute(params![track_id, loved])?;

        Ok(())
    }

    fn set_rate(&self, track_id: i64, rate: u8) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE tracks SET rate = ?2 WHERE id = ?1")?;
        stmt.execute(params![track_id, rate.min(5)])?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> (SqliteLibrary, i64, i64) {
        let library = SqliteLibrary::open_in_memory().unwrap();
        let rock = library.add_genre("Rock").unwrap();
        let artist = library.add_artist("Band").unwrap();
        let album = library.add_album("First", &[artist], Some(2001), false).unwrap();

        for (n, genre) in [(2, rock), (1, rock)] {
            library
                .add_track(&NewTrack {
                    album_id: album,
                    title: format!("Song {}", n),
                    uri: format!("file:///music/{}.flac", n),
                    duration_ms: 180_000,
                    number: n,
                    disc_number: 1,
                    artist_ids: vec![artist],
                    genre_ids: vec![genre],
                    ..Default::default()
                })
                .unwrap();
        }

        (library, album, rock)
    }

    #[test]
    fn tracks_are_hydrated_in_one_row() {
        let (library, album, rock) = library();
        let ids = library.album_track_ids(album, &[], &[]).unwrap();
        let track = library.track(ids[0]).unwrap().unwrap();

        assert_eq!(track.number, 1);
        assert_eq!(track.album_name, "First");
        assert_eq!(track.artists, vec!["Band".to_string()]);
        assert_eq!(track.genre_ids, vec![rock]);
        assert_eq!(track.duration.as_secs(), 180);
    }

    #[test]
    fn missing_rows_are_none() {
        let (library, _, _) = library();
        assert!(library.track(999).unwrap().is_none());
        assert!(library.album(999).unwrap().is_none());
    }

    #[test]
    fn genre_filters_restrict_albums() {
        let (library, album, rock) = library();
        let jazz = library.add_genre("Jazz").unwrap();

        let rock_albums = library
            .album_ids(&Selection::Genres {
                genre_ids: vec![rock],
                artist_ids: vec![],
            })
            .unwrap();
        let jazz_albums = library
            .album_ids(&Selection::Genres {
                genre_ids: vec![jazz],
                artist_ids: vec![],
            })
            .unwrap();

        assert_eq!(rock_albums, vec![album]);
        assert!(jazz_albums.is_empty());
    }

    #[test]
    fn popularity_and_stats_are_written_through() {
        let (library, album, _) = library();
        let ids = library.album_track_ids(album, &[], &[]).unwrap();

        library.increment_track_popularity(ids[0]).unwrap();
        library.increment_album_popularity(album, 3).unwrap();
        library.set_loved(ids[0], true).unwrap();
        library.set_rate(ids[0], 9).unwrap();

        let track = library.track(ids[0]).unwrap().unwrap();
        assert_eq!(track.popularity, 1);
        assert!(track.loved);
        assert_eq!(track.rate, 5);
        assert_eq!(library.album_popularity(album).unwrap(), 3);
        assert_eq!(
            library.album_ids(&Selection::Populars).unwrap(),
            vec![album]
        );
    }

    #[test]
    fn artist_names_find_albums() {
        let (library, album, _) = library();
        assert_eq!(library.album_ids_for_artist("band").unwrap(), vec![album]);
        assert_eq!(library.max_album_track_count().unwrap(), 2);
    }
}
