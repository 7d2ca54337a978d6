fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/discovery/v1/discovery.proto");
    println!("cargo:rerun-if-changed=proto");
    println!("cargo:rerun-if-env-changed=PROTOC");

    // 未指定 PROTOC 时使用内置的 protoc
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path().map_err(|e| e.to_string())?;
        // SAFETY: build 脚本是单线程执行的
        unsafe {
            std::env::set_var("PROTOC", protoc);
        }
    }

    tonic_prost_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(&["proto/discovery/v1/discovery.proto"], &["proto"])?;

    Ok(())
}
