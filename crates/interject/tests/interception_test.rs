//! Interception through registry-resolved wrappers.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::*;
use interject::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_zero_aspects_are_transparent(a in any::<i64>(), b in -5i64..5) {
        let fx = Fixture::new();
        fx.registry.register_type::<dyn Foo, FooImpl>().unwrap().aop(true);
        let foo = fx.foo();

        prop_assert_eq!(foo.divide(a, b), FooImpl.divide(a, b));
        prop_assert_eq!(foo.name(), FooImpl.name());
    }
}

#[test]
fn test_aspects_run_in_binding_order() {
    let fx = Fixture::new();
    fx.registry
        .register_type::<dyn Foo, FooImpl>()
        .unwrap()
        .aspect(step::<1>())
        .aspect(step::<2>())
        .aspect(step::<3>());

    let foo = fx.foo();
    assert_eq!(foo.divide(4, 0), Err(DivideError(4, 0)));
    assert_eq!(
        fx.log.events(),
        vec![
            "1:before:divide",
            "2:before:divide",
            "3:before:divide",
            "1:error:divide",
            "2:error:divide",
            "3:error:divide",
        ]
    );

    fx.log.clear();
    assert_eq!(foo.name(), "foo");
    assert_eq!(
        fx.log.events(),
        vec![
            "1:before:name",
            "2:before:name",
            "3:before:name",
            "1:result:name",
            "2:result:name",
            "3:result:name",
        ]
    );
}

#[test]
fn test_static_aspects_run_before_dynamic_ones() {
    struct Tagged;

    impl Foo for Tagged {
        fn name(&self) -> String {
            "tagged".into()
        }

        fn divide(&self, a: i64, _b: i64) -> Result<i64, DivideError> {
            Ok(a)
        }
    }

    let fx = Fixture::new();
    fx.registry.describe(
        TypeInfo::class::<Tagged>()
            .default_constructor(|| Tagged)
            .implements::<dyn Foo, _>(|t| t as Arc<dyn Foo>)
            .aspect(step::<2>())
            .build(),
    );
    fx.registry
        .register_type::<dyn Foo, Tagged>()
        .unwrap()
        .aspect(step::<1>());

    assert_eq!(fx.foo().name(), "tagged");
    assert_eq!(
        fx.log.events(),
        vec!["2:before:name", "1:before:name", "2:result:name", "1:result:name"]
    );
}

#[test]
fn test_failing_factory_is_skipped() {
    let fx = Fixture::new();
    fx.registry
        .register_type::<dyn Foo, FooImpl>()
        .unwrap()
        .aspect_of::<Broken>()
        .aspect(step::<1>());

    assert_eq!(fx.foo().divide(8, 2), Ok(4));
    assert_eq!(fx.log.events(), vec!["1:before:divide", "1:result:divide"]);
}

#[test]
fn test_disposable_aspects_dispose_once_per_call() {
    let fx = Fixture::new();
    fx.registry
        .register_type::<dyn Foo, FooImpl>()
        .unwrap()
        .aspect_of::<Scoped>();

    let foo = fx.foo();
    foo.name();
    let _ = foo.divide(1, 0);
    assert_eq!(fx.disposed.load(Ordering::SeqCst), 2);
}

#[test]
fn test_interface_proxy_wraps_instances_and_factories() {
    let fx = Fixture::new();
    fx.registry
        .register_instance::<dyn Foo>(Arc::new(AltFoo))
        .name("instance")
        .aspect(step::<1>());
    fx.registry
        .register_factory(|_: &Registry| -> std::result::Result<Arc<dyn Foo>, BoxError> {
            Ok(Arc::new(FooImpl))
        })
        .name("factory")
        .aspect(step::<2>());

    let instance = fx.registry.get_by_name::<dyn Foo>("instance").unwrap().unwrap();
    let factory = fx.registry.get_by_name::<dyn Foo>("factory").unwrap().unwrap();
    assert_eq!(instance.name(), "alt");
    assert_eq!(factory.name(), "foo");
    assert_eq!(
        fx.log.events(),
        vec!["1:before:name", "1:result:name", "2:before:name", "2:result:name"]
    );

    let descriptor = fx
        .registry
        .proxies()
        .cached(&TypeKey::of::<dyn Foo>())
        .unwrap();
    assert_eq!(descriptor.interceptable_methods(), &["name", "divide"]);
}

#[test]
fn test_class_proxy_is_cached_per_type() {
    let fx = Fixture::new();
    fx.registry
        .register_type::<dyn Foo, FooImpl>()
        .unwrap()
        .aspect(step::<1>());

    fx.foo();
    fx.foo();
    let key = TypeKey::of::<FooImpl>();
    let cached = fx.registry.proxies().cached(&key).unwrap();
    let built = fx.registry.proxies().build_class_proxy(&key).unwrap();
    assert!(Arc::ptr_eq(&cached, &built));

    let raw = built.instantiate(0, vec![]).unwrap();
    assert!(fx.registry.catalog().is_assignable(raw.type_key(), built.target()));
    assert!(fx
        .registry
        .catalog()
        .is_assignable(raw.type_key(), &TypeKey::of::<dyn Foo>()));
}

#[test]
fn test_sealed_implementation_cannot_be_wrapped() {
    struct Locked;

    impl Foo for Locked {
        fn name(&self) -> String {
            "locked".into()
        }

        fn divide(&self, _a: i64, _b: i64) -> Result<i64, DivideError> {
            Ok(0)
        }
    }

    let fx = Fixture::new();
    fx.registry.describe(
        TypeInfo::class::<Locked>()
            .sealed()
            .default_constructor(|| Locked)
            .implements::<dyn Foo, _>(|l| l as Arc<dyn Foo>)
            .build(),
    );

    let reg = fx.registry.register_type::<dyn Foo, Locked>().unwrap();
    assert_eq!(fx.foo().name(), "locked");

    reg.aop(true);
    let err = fx.registry.get::<dyn Foo>().err().unwrap();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("sealed"));
}

#[test]
fn test_hook_substitution_is_not_wrapped() {
    let fx = Fixture::new();
    fx.registry
        .register_type::<dyn Foo, FooImpl>()
        .unwrap()
        .aspect(step::<1>());
    fx.registry
        .add_hook(|_: &Registry, request: &ResolveRequest<'_>| {
            (request.entry.is_aop() && request.args.is_none()).then(|| Instance::new(AltFoo))
        });

    let foo = fx.foo();
    assert_eq!(foo.name(), "alt");
    assert!(fx.log.events().is_empty());
}

#[test]
fn test_logging_aspect_passes_values_through() {
    let fx = Fixture::new();
    fx.registry
        .register_type::<dyn Foo, FooImpl>()
        .unwrap()
        .aspect_of::<LoggingAspect>();

    let foo = fx.foo();
    assert_eq!(foo.divide(10, 5), Ok(2));
    assert_eq!(foo.divide(10, 0), Err(DivideError(10, 0)));
}

#[test]
fn test_aop_by_default() {
    let fx = Fixture::with_config(RegistryConfig::default().with_aop_by_default(true));
    let reg = fx.registry.register_type::<dyn Foo, FooImpl>().unwrap();
    assert!(reg.entry().is_aop());

    fx.foo().name();
    assert!(fx.registry.proxies().cached(&TypeKey::of::<FooImpl>()).is_some());
}
