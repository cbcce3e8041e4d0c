fn main() {
    println!("cargo:rerun-if-changed=proto/vaultaire.proto");
    prost_build::compile_protos(&["proto/vaultaire.proto"], &["proto"])
        .expect("failed to compile vaultaire.proto");
}
