//! 키 명령어

use anyhow::Context as _;
use base64::{engine::general_purpose, Engine as _};

use cardauth_core::crypto::{
    parse_key_material, CryptoCapability, DalekCrypto, PrivateKey, PublicKey,
};

/// 새 키 쌍 생성 후 출력
pub fn keygen(json: bool) -> anyhow::Result<()> {
    let crypto = DalekCrypto::new();
    let private = crypto.generate_private_key()?;
    let public = crypto.extract_public_key(&private)?;

    let private_bytes = crypto.export_private_key(&private);
    let private_text = general_purpose::URL_SAFE_NO_PAD.encode(private_bytes.as_slice());
    let public_text = general_purpose::STANDARD.encode(crypto.export_public_key(&public));
    let fingerprint = crypto.fingerprint(&public);

    if json {
        let out = serde_json::json!({
            "private_key": private_text,
            "public_key": public_text,
            "fingerprint": fingerprint,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Private key: {private_text}");
        println!("Public key:  {public_text}");
        println!("Fingerprint: {fingerprint}");
        println!();
        println!("Keep the private key secret. Register the public key with the card directory.");
    }
    Ok(())
}

pub fn load_private_key(crypto: &dyn CryptoCapability, raw: &str) -> anyhow::Result<PrivateKey> {
    let material = parse_key_material(raw)
        .context("private key must be 32 bytes (hex, base64url or base64)")?;
    Ok(crypto.import_private_key(&material)?)
}

pub fn load_public_key(crypto: &dyn CryptoCapability, raw: &str) -> anyhow::Result<PublicKey> {
    let material = parse_key_material(raw)
        .context("public key must be 32 bytes (hex, base64url or base64)")?;
    Ok(crypto.import_public_key(&material)?)
}
