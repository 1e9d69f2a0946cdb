// Linux-specific helpers: /proc/self/mountinfo.

use std::path::Path;

pub(super) const MOUNTINFO: &str = "/proc/self/mountinfo";

/// Mount points listed in a mountinfo dump (field 5), with octal escapes (`\040`) decoded.
pub(super) fn parse_mount_points(mountinfo: &str) -> Vec<String> {
    mountinfo
        .lines()
        .filter_map(|line| line.split_whitespace().nth(4))
        .map(unescape_octal)
        .collect()
}

/// True when `path` is itself a mount point according to `mountinfo`.
pub(super) fn is_mount_point(mountinfo: &str, path: &Path) -> bool {
    let wanted = path.to_string_lossy();
    let wanted = if wanted.len() > 1 {
        wanted.trim_end_matches('/')
    } else {
        &wanted
    };
    parse_mount_points(mountinfo).iter().any(|m| m == wanted)
}

fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let code = (bytes[i] == b'\\' && i + 3 < bytes.len())
            .then(|| &bytes[i + 1..i + 4])
            .filter(|digits| digits.iter().all(|b| (b'0'..=b'7').contains(b)))
            .and_then(|digits| {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                u8::try_from(value).ok()
            });
        if let Some(code) = code {
            out.push(code);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
22 1 8:1 / / rw,relatime shared:1 - ext4 /dev/sda1 rw
35 22 0:31 / /mnt/qnap rw,relatime shared:20 - cifs //nas/recordings rw
36 22 0:32 / /mnt/qnap\\04026tb rw,relatime shared:21 - cifs //nas/overflow rw
";

    #[test]
    fn parses_mount_points_and_decodes_spaces() {
        let points = parse_mount_points(SAMPLE);
        assert_eq!(points, vec!["/", "/mnt/qnap", "/mnt/qnap 26tb"]);
    }

    #[test]
    fn matches_exact_mount_point_only() {
        assert!(is_mount_point(SAMPLE, Path::new("/mnt/qnap")));
        assert!(is_mount_point(SAMPLE, Path::new("/mnt/qnap/")));
        assert!(is_mount_point(SAMPLE, Path::new("/")));
        assert!(!is_mount_point(SAMPLE, Path::new("/mnt/qnap-26tb-2")));
        assert!(!is_mount_point(SAMPLE, Path::new("/mnt")));
    }

    #[test]
    fn out_of_range_escape_is_kept_verbatim() {
        assert_eq!(unescape_octal("/mnt/a\\777b"), "/mnt/a\\777b");
        assert_eq!(unescape_octal("/mnt/tab\\011"), "/mnt/tab\t");
    }
}
