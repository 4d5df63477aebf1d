fn main() -> Result<(), Box<dyn std::error::Error>> {
    eventkit_codegen::build::compile_schema("schema")?;
    Ok(())
}
