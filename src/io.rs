//! I/O helpers for oriented point clouds and JSON.
//!
//! - `parse_xyzn` / `load_xyzn`: read whitespace-separated `x y z nx ny nz`
//!   lines. Blank lines and lines starting with `#` are skipped.
//! - `write_xyzn`: write points in the same format.
//! - `write_json_file`: pretty-print a serializable value to disk.
use crate::types::PointWithNormal;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Parse `x y z nx ny nz` records from text. `origin` names the source in
/// error messages.
pub fn parse_xyzn(text: &str, origin: &str) -> Result<Vec<PointWithNormal>, String> {
    let mut points = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut values = [0.0f64; 6];
        let mut fields = line.split_whitespace();
        for (k, slot) in values.iter_mut().enumerate() {
            let field = fields.next().ok_or_else(|| {
                format!("{origin}:{}: expected 6 values, found {k}", lineno + 1)
            })?;
            *slot = field
                .parse()
                .map_err(|e| format!("{origin}:{}: invalid number '{field}': {e}", lineno + 1))?;
        }
        if fields.next().is_some() {
            return Err(format!("{origin}:{}: more than 6 values", lineno + 1));
        }
        points.push(PointWithNormal::from_arrays(
            [values[0], values[1], values[2]],
            [values[3], values[4], values[5]],
        ));
    }
    Ok(points)
}

/// Load an `x y z nx ny nz` point cloud from disk.
pub fn load_xyzn(path: &Path) -> Result<Vec<PointWithNormal>, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    parse_xyzn(&text, &path.display().to_string())
}

/// Write points as `x y z nx ny nz` lines, creating parent directories.
pub fn write_xyzn<'a, I>(path: &Path, points: I) -> Result<(), String>
where
    I: IntoIterator<Item = &'a PointWithNormal>,
{
    ensure_parent_dir(path)?;
    let mut out = String::new();
    for p in points {
        let (q, n) = (&p.position, &p.normal);
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{} {} {} {} {} {}", q.x, q.y, q.z, n.x, n.y, n.z);
    }
    fs::write(path, out).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_and_skips_comments() {
        let text = "# x y z nx ny nz\n\n1 2 3 0 0 2\n  -1.5 0 0.25   1 0 0  \n";
        let points = parse_xyzn(text, "inline").expect("valid cloud");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].position.z, 3.0);
        assert_eq!(points[0].normal.z, 1.0, "normals are normalized");
        assert_eq!(points[1].position.x, -1.5);
    }

    #[test]
    fn reports_line_numbers() {
        let err = parse_xyzn("0 0 0 0 0 1\n0 0 zero 0 0 1\n", "cloud.xyzn").unwrap_err();
        assert!(err.starts_with("cloud.xyzn:2:"), "unexpected message: {err}");
        let err = parse_xyzn("0 0 0 0 0\n", "cloud.xyzn").unwrap_err();
        assert!(err.contains("expected 6 values, found 5"), "unexpected message: {err}");
        assert!(parse_xyzn("0 0 0 0 0 1 7\n", "c").is_err());
    }

    #[test]
    fn write_then_load_preserves_points() {
        let dir = std::env::temp_dir().join(format!("shape_detector_io_{}", std::process::id()));
        let path = dir.join("nested").join("cloud.xyzn");
        let points = vec![
            PointWithNormal::from_arrays([0.5, -2.0, 3.25], [0.0, 1.0, 0.0]),
            PointWithNormal::from_arrays([1.0, 1.0, 1.0], [0.0, 0.0, -1.0]),
        ];
        write_xyzn(&path, &points).expect("write");
        let loaded = load_xyzn(&path).expect("load");
        assert_eq!(loaded, points);
        let _ = fs::remove_dir_all(&dir);
    }
}
