//! Bundling several passes into one `.pkpasses` archive

use crate::bundle::{Bundle, PASSES_MIME_TYPE};
use crate::error::Result;
use crate::pass::Pass;
use tracing::info;

/// Close every pass and store it as `packed-pass-<n>`, 1-based
///
/// The returned bundle is already frozen. Fails on the first pass that
/// cannot be closed.
pub fn pack(passes: &mut [Pass]) -> Result<Bundle> {
    let mut bundle = Bundle::new(PASSES_MIME_TYPE)?;

    for (index, pass) in passes.iter_mut().enumerate() {
        let data = pass.export_bytes()?;
        bundle.add_buffer(&format!("packed-pass-{}", index + 1), data)?;
    }

    bundle.freeze()?;
    info!("Packed {} passes", passes.len());
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveReader;
    use crate::certificates::Certificates;
    use crate::error::PassError;
    use crate::schema::PassKind;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn generic_pass(certificates: &Arc<Certificates>) -> Pass {
        let mut pass = Pass::new(BTreeMap::new(), Some(Arc::clone(certificates)), None).unwrap();
        pass.set_kind(PassKind::Generic).unwrap();
        pass
    }

    fn certificates() -> Arc<Certificates> {
        Arc::new(
            Certificates::from_pem(
                include_bytes!("../tests/fixtures/certs/wwdr.pem"),
                include_bytes!("../tests/fixtures/certs/signerCert.pem"),
                include_bytes!("../tests/fixtures/certs/signerKey.pem"),
                None,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_pack_names_and_freezes() {
        let certificates = certificates();
        let mut passes = vec![generic_pass(&certificates), generic_pass(&certificates)];

        let mut bundle = pack(&mut passes).unwrap();
        assert!(bundle.is_frozen());
        assert_eq!(bundle.mime_type(), PASSES_MIME_TYPE);
        assert!(passes.iter().all(Pass::is_frozen));

        let reader = ArchiveReader::from_bytes(bundle.export_bytes().unwrap()).unwrap();
        assert_eq!(
            reader.list_files(),
            ["packed-pass-1", "packed-pass-2"]
        );
        assert!(matches!(
            bundle.add_buffer("extra", vec![1]),
            Err(PassError::Closed(_))
        ));
    }

    #[test]
    fn test_pack_empty() {
        let bundle = pack(&mut []).unwrap();
        assert!(bundle.is_frozen());
        assert!(bundle.files().is_empty());
    }

    #[test]
    fn test_pack_fails_on_unfinishable_pass() {
        let certificates = certificates();
        let mut passes = vec![
            generic_pass(&certificates),
            Pass::new(BTreeMap::new(), Some(certificates), None).unwrap(),
        ];

        assert!(matches!(pack(&mut passes), Err(PassError::MissingKind)));
    }
}
