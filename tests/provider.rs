use litecompat::container::ConfigGuiCandidates;
use litecompat::jvm::class_file::ConstantIndex;
use litecompat::jvm::model::{Annotation, ClassNode, Code, MemberRef, MethodNode, PoolEntry};
use litecompat::jvm::{self, ClassAccessFlags, MethodAccessFlags};
use litecompat::location::Location;
use litecompat::mappings::MappingSet;
use litecompat::provider::{ClassProvider, Error};
use litecompat::remap::{MappingRemapper, Remapper};
use litecompat::settings::Settings;
use litecompat::source::{ArchiveSource, DirectorySource, ModSource};

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;
use zip::write::{FileOptions, ZipWriter};

const MAPPINGS: &str = "tiny\t2\t0\tintermediary\tnamed
c\tnet/minecraft/class_5641\tnet/minecraft/client/gui/screen/option/GameOptionsScreen
\tm\t()V\tmethod_25426\tinit
";

const MIXIN: &str = "Lorg/spongepowered/asm/mixin/Mixin;";
const OVERWRITE: &str = "Lorg/spongepowered/asm/mixin/Overwrite;";
const INTERMEDIARY_SCREEN: &str = "net/minecraft/class_5641";
const NAMED_SCREEN: &str = "net/minecraft/client/gui/screen/option/GameOptionsScreen";

/// Remapper that remembers every class it was shown
struct RecordingRemapper {
    inner: MappingRemapper,
    registered: Mutex<Vec<String>>,
}

impl RecordingRemapper {
    fn registrations(&self, name: &str) -> usize {
        let registered = self.registered.lock().unwrap();
        registered.iter().filter(|registered| *registered == name).count()
    }
}

impl Remapper for RecordingRemapper {
    fn register_class(&self, class: &ClassNode) {
        self.registered.lock().unwrap().push(class.name.clone());
        self.inner.register_class(class);
    }

    fn map_type(&self, name: &str) -> String {
        self.inner.map_type(name)
    }

    fn map_field_name(&self, owner: &str, name: &str, descriptor: &str) -> String {
        self.inner.map_field_name(owner, name, descriptor)
    }

    fn map_method_name(&self, owner: &str, name: &str, descriptor: &str) -> String {
        self.inner.map_method_name(owner, name, descriptor)
    }
}

/// Source whose first few reads fail, as if the disk went away
struct FlakySource {
    inner: DirectorySource,
    failures_left: AtomicUsize,
}

impl ModSource for FlakySource {
    fn exists(&self, path: &str) -> bool {
        self.inner.exists(path)
    }

    fn read_all(&self, path: &str) -> io::Result<Vec<u8>> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(io::Error::new(io::ErrorKind::Other, "disk"));
        }
        self.inner.read_all(path)
    }

    fn location(&self, path: &str) -> io::Result<Location> {
        self.inner.location(path)
    }

    fn entries(&self) -> io::Result<Vec<String>> {
        self.inner.entries()
    }
}

/// Public config screen, which overrides `method_25426` and calls the super implementation
fn config_screen() -> ClassNode {
    let mut class = ClassNode::new("me/alec/ConfigScreen", Some(INTERMEDIARY_SCREEN));
    let super_init = class.constants.push(PoolEntry::MethodRef {
        member: MemberRef {
            owner: String::from(INTERMEDIARY_SCREEN),
            name: String::from("method_25426"),
            descriptor: String::from("()V"),
        },
        is_interface: false,
    });
    let [hi, lo] = super_init.0.to_be_bytes();

    let mut init = MethodNode::new(MethodAccessFlags::PROTECTED, "method_25426", "()V");
    init.code = Some(Code {
        max_stack: 1,
        max_locals: 1,
        bytecode: vec![0x2A, 0xB7, hi, lo, 0xB1], // aload_0, invokespecial, return
        exception_table: vec![],
        stack_map_frames: None,
        local_variables: vec![],
        local_variable_types: vec![],
        attributes: vec![],
    });
    class.methods.push(init);
    class
}

fn abstract_screen() -> ClassNode {
    let mut class = ClassNode::new("me/alec/AbstractScreen", Some(INTERMEDIARY_SCREEN));
    class.access_flags |= ClassAccessFlags::ABSTRACT;
    class
}

fn screen_mixin() -> ClassNode {
    let mut class = ClassNode::new("me/alec/mixin/ScreenMixin", Some(INTERMEDIARY_SCREEN));
    class.invisible_annotations.push(Annotation::new(MIXIN));

    let annotated = |access_flags, name: &str, annotation: Option<&str>| {
        let mut method = MethodNode::new(access_flags, name, "()V");
        method
            .visible_annotations
            .extend(annotation.map(Annotation::new));
        method
    };
    class.methods = vec![
        annotated(MethodAccessFlags::PRIVATE, "plain", None),
        annotated(MethodAccessFlags::PRIVATE, "deprecated", Some("Ljava/lang/Deprecated;")),
        annotated(MethodAccessFlags::PROTECTED, "overwrite", Some(OVERWRITE)),
        annotated(MethodAccessFlags::PRIVATE | MethodAccessFlags::STATIC, "helper", None),
    ];
    class
}

fn write_class(root: &Path, class: &ClassNode) {
    let path = root.join(format!("{}.class", class.name));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, jvm::encode(class).unwrap()).unwrap();
}

fn write_mod(root: &Path) {
    write_class(root, &config_screen());
    write_class(root, &abstract_screen());
    write_class(root, &screen_mixin());
    fs::write(root.join("me/alec/Broken.class"), [0xCA, 0xFE, 0xBA, 0xBE, 0, 0]).unwrap();
    fs::create_dir_all(root.join("assets/litecompat")).unwrap();
    fs::write(root.join("assets/litecompat/icon.png"), b"not really a png").unwrap();
}

struct Fixture {
    dir: TempDir,
    source: Arc<dyn ModSource>,
    remapper: Arc<RecordingRemapper>,
    candidates: Arc<ConfigGuiCandidates>,
    provider: ClassProvider,
}

fn settings(dir: &Path, development_mode: bool, mappings: &MappingSet) -> Settings {
    let mut settings = Settings::new(dir.join("tmp"));
    settings.development_mode = development_mode;
    settings.dump_directory = Some(dir.join("dump"));
    settings.resolve_config_gui_super_classes(&mappings.resolver("named").unwrap());
    settings
}

fn fixture_with(
    development_mode: bool,
    open_source: impl FnOnce(&Path) -> Arc<dyn ModSource>,
) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mappings = MappingSet::parse(MAPPINGS).unwrap();
    let source = open_source(dir.path());
    let remapper = Arc::new(RecordingRemapper {
        inner: mappings.remapper("intermediary", "named").unwrap(),
        registered: Mutex::new(vec![]),
    });
    let candidates = Arc::new(ConfigGuiCandidates::new());
    let provider = ClassProvider::new(
        source.clone(),
        remapper.clone(),
        candidates.clone(),
        settings(dir.path(), development_mode, &mappings),
    );
    Fixture {
        dir,
        source,
        remapper,
        candidates,
        provider,
    }
}

fn fixture(development_mode: bool) -> Fixture {
    fixture_with(development_mode, |dir| {
        let root = dir.join("mod");
        write_mod(&root);
        Arc::new(DirectorySource::open(&root).unwrap())
    })
}

fn method_access(class: &ClassNode) -> Vec<(String, MethodAccessFlags)> {
    class
        .methods
        .iter()
        .map(|method| (method.name.clone(), method.access_flags))
        .collect()
}

#[test]
fn class_bytes_are_computed_once() {
    let fixture = fixture(false);
    let first = fixture.provider.class_bytes("me.alec.ConfigScreen").unwrap().unwrap();
    let second = fixture.provider.class_bytes("me/alec/ConfigScreen").unwrap().unwrap();

    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fixture.remapper.registrations("me/alec/ConfigScreen"), 1);
    assert_eq!(fixture.provider.cached_class_count(), 1);
}

#[test]
fn concurrent_requests_share_one_pipeline_run() {
    let fixture = fixture(false);
    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let bytes = fixture.provider.class_bytes("me.alec.ConfigScreen").unwrap();
                assert!(bytes.is_some());
            });
        }
    });
    assert_eq!(fixture.remapper.registrations("me/alec/ConfigScreen"), 1);
    assert_eq!(fixture.candidates.len(), 1);
}

#[test]
fn classes_are_remapped() {
    let fixture = fixture(false);
    let node = fixture
        .provider
        .class_node("me.alec.ConfigScreen")
        .unwrap()
        .unwrap();

    assert_eq!(node.super_name.as_deref(), Some(NAMED_SCREEN));
    assert_eq!(node.methods[0].name, "init");

    // The super call keeps its pool slot, so the bytecode is untouched
    let code = node.methods[0].code.as_ref().unwrap();
    assert_eq!(code.bytecode[1], 0xB7);
    let operand = u16::from_be_bytes([code.bytecode[2], code.bytecode[3]]);
    assert_eq!(
        node.constants.get(ConstantIndex(operand)),
        Some(&PoolEntry::MethodRef {
            member: MemberRef {
                owner: String::from(NAMED_SCREEN),
                name: String::from("init"),
                descriptor: String::from("()V"),
            },
            is_interface: false,
        })
    );
}

#[test]
fn missing_classes_are_absent_but_broken_ones_fail() {
    let fixture = fixture(false);
    assert!(fixture.provider.class_bytes("me.alec.Missing").unwrap().is_none());
    assert!(fixture.provider.class_node("me.alec.Missing").unwrap().is_none());

    for _ in 0..2 {
        match fixture.provider.class_bytes("me.alec.Broken") {
            Err(Error::MalformedClass { name, .. }) => assert_eq!(name, "me.alec.Broken"),
            other => panic!("expected malformed class, got {:?}", other),
        }
    }
    assert_eq!(fixture.remapper.registrations("me/alec/Broken"), 0);
    assert_eq!(fixture.provider.cached_class_count(), 0);
}

#[test]
fn mixin_methods_widen_only_in_development_mode() {
    let original = method_access(&screen_mixin());

    let production = fixture(false);
    let node = production
        .provider
        .class_node("me.alec.mixin.ScreenMixin")
        .unwrap()
        .unwrap();
    assert_eq!(method_access(&node), original);

    let development = fixture(true);
    let node = development
        .provider
        .class_node("me.alec.mixin.ScreenMixin")
        .unwrap()
        .unwrap();
    assert_eq!(
        method_access(&node),
        vec![
            (String::from("plain"), MethodAccessFlags::PUBLIC),
            (String::from("deprecated"), MethodAccessFlags::PRIVATE),
            (String::from("overwrite"), MethodAccessFlags::PUBLIC),
            (
                String::from("helper"),
                MethodAccessFlags::PRIVATE | MethodAccessFlags::STATIC
            ),
        ]
    );

    // Only mixins get widened
    let node = development
        .provider
        .class_node("me.alec.ConfigScreen")
        .unwrap()
        .unwrap();
    assert_eq!(node.methods[0].access_flags, MethodAccessFlags::PROTECTED);
}

#[test]
fn config_screens_are_classified_once() {
    let fixture = fixture(true);
    for name in [
        "me.alec.ConfigScreen",
        "me.alec.ConfigScreen",
        "me.alec.AbstractScreen",
        "me.alec.mixin.ScreenMixin",
    ] {
        assert!(fixture.provider.class_bytes(name).unwrap().is_some());
    }
    assert_eq!(fixture.candidates.names(), vec!["me/alec/ConfigScreen"]);
}

#[test]
fn class_resources_are_materialized_once() {
    let fixture = fixture(false);
    let first = fixture
        .provider
        .find_resource("me/alec/ConfigScreen.class")
        .unwrap()
        .unwrap();
    let second = fixture
        .provider
        .find_resource("me/alec/ConfigScreen.class")
        .unwrap()
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(fixture.remapper.registrations("me/alec/ConfigScreen"), 1);

    let path = first.to_file_path().unwrap();
    assert!(path.starts_with(fixture.dir.path().join("tmp")));
    let bytes = fixture.provider.class_bytes("me.alec.ConfigScreen").unwrap().unwrap();
    assert_eq!(fs::read(path).unwrap(), bytes.to_vec());
    assert_eq!(fixture.remapper.registrations("me/alec/ConfigScreen"), 1);

    assert!(fixture
        .provider
        .find_resource("me/alec/Missing.class")
        .unwrap()
        .is_none());
}

#[test]
fn plain_resources_come_from_the_mod() {
    let fixture = fixture(false);
    let location = fixture
        .provider
        .find_resource("assets/litecompat/icon.png")
        .unwrap()
        .unwrap();
    assert_eq!(
        location,
        fixture.source.location("assets/litecompat/icon.png").unwrap()
    );
    assert!(fixture
        .dir
        .path()
        .join("dump/resource/assets/litecompat/icon.png")
        .is_file());

    assert!(fixture.provider.find_resource("missing.txt").unwrap().is_none());
}

#[test]
fn transformed_classes_are_dumped() {
    let fixture = fixture(false);
    let bytes = fixture.provider.class_bytes("me.alec.ConfigScreen").unwrap().unwrap();
    let dumped = fixture.dir.path().join("dump/class/me/alec/ConfigScreen.class");
    assert_eq!(fs::read(dumped).unwrap(), bytes.to_vec());
}

#[test]
fn failed_dumps_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("mod");
    write_mod(&root);
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"a file, not a directory").unwrap();

    let mut settings = Settings::new(dir.path().join("tmp"));
    settings.dump_directory = Some(blocker);
    let provider = ClassProvider::new(
        Arc::new(DirectorySource::open(&root).unwrap()),
        Arc::new(MappingRemapper::new()),
        Arc::new(ConfigGuiCandidates::new()),
        settings,
    );

    assert!(provider.class_bytes("me.alec.ConfigScreen").unwrap().is_some());
    assert!(provider
        .find_resource("assets/litecompat/icon.png")
        .unwrap()
        .is_some());
}

#[test]
fn read_faults_are_propagated_and_not_cached() {
    let fixture = fixture_with(false, |dir| {
        let root = dir.join("mod");
        write_mod(&root);
        Arc::new(FlakySource {
            inner: DirectorySource::open(&root).unwrap(),
            failures_left: AtomicUsize::new(1),
        })
    });

    match fixture.provider.class_bytes("me.alec.ConfigScreen") {
        Err(Error::Io(err)) => assert_eq!(err.to_string(), "disk"),
        other => panic!("expected i/o error, got {:?}", other),
    }
    assert_eq!(fixture.provider.cached_class_count(), 0);
    assert_eq!(fixture.remapper.registrations("me/alec/ConfigScreen"), 0);

    assert!(fixture
        .provider
        .class_bytes("me.alec.ConfigScreen")
        .unwrap()
        .is_some());
    assert_eq!(fixture.remapper.registrations("me/alec/ConfigScreen"), 1);
}

#[test]
fn materialization_write_faults_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("mod");
    write_mod(&root);
    let blocker = dir.path().join("tmp");
    fs::write(&blocker, b"a file, not a directory").unwrap();

    let mut settings = Settings::new(blocker);
    settings.dump_directory = None;
    let provider = ClassProvider::new(
        Arc::new(DirectorySource::open(&root).unwrap()),
        Arc::new(MappingRemapper::new()),
        Arc::new(ConfigGuiCandidates::new()),
        settings,
    );

    for _ in 0..2 {
        match provider.find_resource("me/alec/ConfigScreen.class") {
            Err(Error::Io(_)) => (),
            other => panic!("expected i/o error, got {:?}", other),
        }
    }
    // The class itself was fine, only writing it out failed
    assert!(provider.class_bytes("me.alec.ConfigScreen").unwrap().is_some());
}

#[test]
fn archive_locations_are_singly_escaped() {
    let fixture = fixture_with(false, |dir| {
        let path = dir.join("My Mod.litemod");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        let options = FileOptions::default();
        zip.start_file("assets/litecompat/icon.png", options).unwrap();
        zip.write_all(b"not really a png").unwrap();
        zip.start_file(
            format!("{}.class", config_screen().name),
            options,
        )
        .unwrap();
        zip.write_all(&jvm::encode(&config_screen()).unwrap()).unwrap();
        zip.finish().unwrap();
        Arc::new(ArchiveSource::open(&path).unwrap())
    });

    let raw = fixture.source.location("assets/litecompat/icon.png").unwrap();
    assert!(raw.as_str().contains("My%2520Mod.litemod"));

    let location = fixture
        .provider
        .find_resource("assets/litecompat/icon.png")
        .unwrap()
        .unwrap();
    assert!(location.as_str().starts_with("jar:file:///"));
    assert!(location
        .as_str()
        .ends_with("/My%20Mod.litemod!/assets/litecompat/icon.png"));
    assert!(!location.as_str().contains("%25"));

    assert!(fixture
        .provider
        .class_bytes("me.alec.ConfigScreen")
        .unwrap()
        .is_some());
}
