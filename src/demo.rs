//! The built-in demonstration: one snippet per binding rule.

/// Runs with the builtin registry; `ctxr` with no script prints its output.
pub const SCRIPT: &str = r#"
// default binding: top-level `var` lives on the global context
var example = "Global";
console.log(this.example === example);
console.log(this);
// a plain call sees the same global context
console.log(contextOf());
console.log(contextOf() === this);

let data = { instructor: "Sam" };
console.log(this.instructor);
this.instructor = "Blake";
console.log(this.instructor);
console.log(data.instructor);

// implicit binding: the receiver is the object the method was read from
let person = { firstName: "Sam", sayHi: sayHi, determineContext: isContext };
console.log(person.sayHi());
console.log(person.determineContext(person));

let person2 = {
    firstName: "Sam",
    dog: { sayHello: sayHello, determineContext: isContext }
};
console.log(person2.dog.sayHello());
console.log(person2.dog.determineContext(person2));

// explicit binding: call and apply invoke immediately
console.log(person2.dog.sayHello.call(person2));
console.log(person2.dog.determineContext.call(person2, person2));

let Sam = { firstName: "Sam", sayHi: sayHi };
let Blake = { firstName: "Blake" };
console.log(Sam.sayHi());
console.log(Sam.sayHi.call(Blake));
console.log(sayHello.call(Sam));
console.log(sayHello.call(Blake));

console.log(sumEvenArguments(1, 2, 3, 4));
console.log(sumEvenArguments(1, 2, 6));
console.log(sumEvenArguments(1, 2));

console.log(add.apply(this, [4, 7]));

let addOnlyThreeTimes = invokeMax(add, 3);
console.log(addOnlyThreeTimes(1, 4));
console.log(addOnlyThreeTimes(2, 7));
console.log(addOnlyThreeTimes(1, 3));
console.log(addOnlyThreeTimes(1, 2));

// bind: fixes context and leading arguments, invokes later
let sumNumbers = addNumbers.bind(Sam, 1, 2);
console.log(sumNumbers());
console.log(sumNumbers(3, 4));

// deferred callbacks lose their receiver unless bound
let timeOut = { firstName: "Sam", sayHi: greetLater };
timeOut.sayHi();
let timeOut2 = { firstName: "Sam", sayHi: greetLaterBound };
timeOut2.sayHi();

// constructor binding: a fresh context per call
let sam = new Person("Sam");
console.log(sam.firstName);
"#;
