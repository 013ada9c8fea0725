fn main() {
    // libwlc is only linked when the native engine is compiled in; the stub
    // engine needs no system libraries.
    if std::env::var_os("CARGO_FEATURE_NATIVE").is_some() {
        if let Ok(dir) = std::env::var("WLC_LIB_DIR") {
            println!("cargo:rustc-link-search=native={}", dir);
        }
        println!("cargo:rustc-link-lib=wlc");
    }

    println!("cargo:rerun-if-env-changed=WLC_LIB_DIR");
    println!("cargo:rerun-if-changed=build.rs");
}
