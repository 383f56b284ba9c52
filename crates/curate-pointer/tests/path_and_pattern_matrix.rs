use curate_pointer::{
    format_path, get, is_ancestor, normalize_path, parent, parse_path, PathPattern, PointerError,
};
use serde_json::json;

#[test]
fn path_parse_format_roundtrip_matrix() {
    let cases = ["", "/foo", "/foo/bar", "/a~0b/c~1d", "/arr/0", "/~0/~1"];

    for pointer in cases {
        let path = parse_path(pointer);
        assert_eq!(format_path(&path), pointer);
    }
}

#[test]
fn root_aliases_normalize_to_empty() {
    assert_eq!(normalize_path(""), "");
    assert_eq!(normalize_path("/"), "");
    assert!(parse_path("/").is_empty());
}

#[test]
fn get_matrix() {
    let doc = json!({"foo": {"bar": [10, 20, null]}, "a/b": {"c": 1}});

    assert_eq!(get(&doc, &parse_path("/foo/bar/0")), Some(&json!(10)));
    assert_eq!(get(&doc, &parse_path("/foo/bar/2")), Some(&json!(null)));
    assert_eq!(get(&doc, &parse_path("/foo/bar/3")), None);
    assert_eq!(get(&doc, &parse_path("/foo/bar/-")), None);
    assert_eq!(get(&doc, &parse_path("/a~1b/c")), Some(&json!(1)));
}

#[test]
fn ancestry_matrix() {
    let cases = [
        ("", "/a", true),
        ("/a", "/a/b", true),
        ("/a", "/a/b/c", true),
        ("/a", "/a", false),
        ("/a/b", "/a", false),
        ("/a", "/b/a", false),
    ];
    for (anc, path, expected) in cases {
        assert_eq!(
            is_ancestor(&parse_path(anc), &parse_path(path)),
            expected,
            "{anc} ancestor of {path}"
        );
    }
    assert_eq!(parent(&[]), Err(PointerError::NoParent));
}

#[test]
fn pattern_matrix() {
    let cases = [
        ("/*", "/a", true),
        ("/*", "/a/b", false),
        ("/**", "", true),
        ("/**", "/a/b/c", true),
        ("/competitors/*/name", "/competitors/3/name", true),
        ("/competitors/*/name", "/competitors/name", false),
        ("/**/createdAt", "/a/b/createdAt", true),
        ("/**/createdAt", "/createdAt", true),
        ("/**/createdAt", "/a/createdAt/x", false),
        ("/a/**/z", "/a/z", true),
        ("/a/**/z", "/a/b/c/z", true),
        ("/a/**/z", "/b/z", false),
    ];

    for (pattern, path, expected) in cases {
        let compiled = PathPattern::parse(pattern).expect("valid pattern");
        assert_eq!(compiled.matches_str(path), expected, "{pattern} vs {path}");
    }
}
