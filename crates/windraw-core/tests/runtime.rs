mod common;

use std::sync::Arc;

use common::{MemSurface, MockBackend, RED};
use windraw_core::{
    Backend, BackendKind, BackendPreference, CanvasOptions, Config, IRect, Module, ModuleSet,
    PixelBias, Platform, Rect, Result, Runtime, Size, Target, WindrawError,
};

struct MockPlatform {
    modern: bool,
    legacy: bool,
    probed: Vec<BackendKind>,
    events: Vec<String>,
    fail_text: bool,
    backends: [Arc<dyn Backend<MemSurface>>; 2],
}

impl MockPlatform {
    fn new(modern: bool, legacy: bool) -> Self {
        Self {
            modern,
            legacy,
            probed: Vec::new(),
            events: Vec::new(),
            fail_text: false,
            backends: [
                MockBackend::new(PixelBias::DIRECT2D)
                    .with_kind(BackendKind::Modern)
                    .shared(),
                MockBackend::new(PixelBias::NONE)
                    .with_kind(BackendKind::Legacy)
                    .shared(),
            ],
        }
    }
}

impl Platform for MockPlatform {
    type Surface = MemSurface;

    fn probe(&mut self, kind: BackendKind) -> bool {
        self.probed.push(kind);
        match kind {
            BackendKind::Modern => self.modern,
            BackendKind::Legacy => self.legacy,
        }
    }

    fn init(&mut self, kind: BackendKind, module: Module) -> Result<()> {
        if self.fail_text && module == Module::TextLayout {
            return Err(WindrawError::native("DWriteCreateFactory", -2147467259));
        }
        self.events.push(format!("init {} {:?}", kind, module));
        Ok(())
    }

    fn fini(&mut self, kind: BackendKind, module: Module) {
        self.events.push(format!("fini {} {:?}", kind, module));
    }

    fn backend(&self, kind: BackendKind) -> Option<Arc<dyn Backend<MemSurface>>> {
        Some(Arc::clone(match kind {
            BackendKind::Modern => &self.backends[0],
            BackendKind::Legacy => &self.backends[1],
        }))
    }
}

fn runtime(platform: MockPlatform, backend: BackendPreference) -> Runtime<MockPlatform> {
    Runtime::new(platform, Config::default().with_backend(backend))
}

#[test]
fn test_probe_runs_once_and_prefers_modern() {
    let rt = runtime(MockPlatform::new(true, true), BackendPreference::Auto);
    assert_eq!(rt.backend(), Some(BackendKind::Modern));
    assert_eq!(rt.backend(), Some(BackendKind::Modern));
    rt.acquire(ModuleSet::CORE).unwrap();
    rt.release(ModuleSet::CORE);

    rt.with_platform(|p| {
        assert_eq!(p.probed, vec![BackendKind::Modern]);
        assert_eq!(p.events, vec!["init d2d Core", "fini d2d Core"]);
    });
}

#[test]
fn test_legacy_preference_skips_modern() {
    let rt = runtime(MockPlatform::new(true, true), BackendPreference::Legacy);
    assert_eq!(rt.backend(), Some(BackendKind::Legacy));
    rt.with_platform(|p| assert_eq!(p.probed, vec![BackendKind::Legacy]));
}

#[test]
fn test_no_backend_fails_acquire() {
    let rt = runtime(MockPlatform::new(false, false), BackendPreference::Auto);
    let err = rt.acquire(ModuleSet::CORE).unwrap_err();
    match err {
        WindrawError::ModuleInit { module, source } => {
            assert_eq!(module, Module::Core);
            assert!(matches!(*source, WindrawError::NoBackend));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(rt.ref_count(Module::Core), 0);
    assert_eq!(rt.backend(), None);
}

#[test]
fn test_partial_failure_rolls_back_modules() {
    let mut platform = MockPlatform::new(false, true);
    platform.fail_text = true;
    let rt = runtime(platform, BackendPreference::Auto);

    assert!(rt
        .acquire(ModuleSet::IMAGE_CODEC | ModuleSet::TEXT_LAYOUT)
        .is_err());
    for module in Module::PRIORITY {
        assert_eq!(rt.ref_count(module), 0);
    }
    rt.with_platform(|p| {
        assert_eq!(
            p.events,
            vec![
                "init gdiplus Core",
                "init gdiplus ImageCodec",
                "fini gdiplus ImageCodec",
                "fini gdiplus Core",
            ]
        );
    });
}

#[test]
fn test_canvas_requires_core() {
    let rt = runtime(MockPlatform::new(false, true), BackendPreference::Auto);
    let mut target = MemSurface::new("target", Size::new(10, 10));
    let err = rt
        .create_canvas(
            Target::Borrowed(&mut target),
            CanvasOptions::new(Size::new(10, 10)),
        )
        .unwrap_err();
    assert!(matches!(err, WindrawError::NotInitialized(Module::Core)));
    drop(rt.session(ModuleSet::CORE).unwrap());
    let err = rt
        .create_canvas(
            Target::Borrowed(&mut target),
            CanvasOptions::new(Size::new(10, 10)),
        )
        .unwrap_err();
    assert!(matches!(err, WindrawError::NotInitialized(Module::Core)));
}

#[test]
fn test_session_draws_through_selected_backend() {
    let rt = runtime(MockPlatform::new(false, true), BackendPreference::Auto);
    let mut target = MemSurface::new("target", Size::new(10, 10));
    let view = target.clone();
    {
        let session = rt.session(ModuleSet::TEXT_LAYOUT).unwrap();
        assert_eq!(session.modules(), ModuleSet::CORE | ModuleSet::TEXT_LAYOUT);
        assert_eq!(rt.ref_count(Module::TextLayout), 1);

        let mut canvas = rt
            .create_canvas(
                Target::Borrowed(&mut target),
                CanvasOptions::new(Size::new(10, 10)),
            )
            .unwrap();
        assert_eq!(canvas.backend_kind(), BackendKind::Legacy);
        canvas.fill_rect(RED, &Rect::new(0.0, 0.0, 2.0, 2.0)).unwrap();
        canvas.release().unwrap();
    }
    assert_eq!(rt.ref_count(Module::Core), 0);
    assert_eq!(rt.ref_count(Module::TextLayout), 0);
    assert_eq!(view.bounds_of(RED), Some(IRect::new(0, 0, 2, 2)));
}

#[test]
fn test_config_is_kept() {
    let rt = runtime(MockPlatform::new(true, false), BackendPreference::Modern);
    assert_eq!(rt.config().backend, BackendPreference::Modern);
    assert!(format!("{:?}", rt).contains("core: 0"));
}
