/// Build script for Prism
///
/// 内置着色器通过 `include_str!` 嵌入，修改后需要重新编译。
fn main() {
    println!("cargo:rerun-if-changed=src/shader/shaders/vertex.glsl");
    println!("cargo:rerun-if-changed=src/shader/shaders/fragment.glsl");
}
